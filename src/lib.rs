/*!

# Ethereum Connector

This library is meant to be used for web applications that need to interact with Ethereum
wallets. Whichever wallet the user picked, the application deals with one [`Connector`] and one
set of events.

## Features

- Connect to MetaMask (or any extension injecting `window.ethereum`)
- Connect to mobile wallets through a WalletConnect session
- Detect Ledger devices over WebHID
- Receive the wallet's events as typed [`ConnectorEvent`]s

## Usage

First create the connector of the wallet the user selected and subscribe to the events you care
about:

```no_run
use eth_connector::{Connector, EventKind, ProviderKind};

let connector = Connector::new(ProviderKind::Metamask);
connector.subscribe(EventKind::AccountsChanged, |event| {
    println!("{event:?}");
});
```

Subscribing is possible at any time but no event is emitted until the provider is initialized.
Then ask the user for access to their accounts:

```no_run
# use eth_connector::{Connector, ProviderKind};
#
# async fn test() -> anyhow::Result<()> {
# let connector = Connector::new(ProviderKind::Metamask);
connector.init_provider().await?;
let accounts = connector.activate().await?;
# Ok(()) }
```

[`Connector::init_provider`] fails with [`Error::ProviderUnavailable`] if the wallet could not be
found (e.g. the extension is not installed) and every other operation fails with
[`Error::NotInitialized`] until it succeeded.

[`Error::ProviderUnavailable`]: crate::error::Error::ProviderUnavailable
[`Error::NotInitialized`]: crate::error::Error::NotInitialized

*/

pub mod config;
mod connector;
pub mod error;
pub mod ethereum;
mod events;
mod export;
pub mod factory;
pub mod ffi;
pub mod provider;
mod wallet;

#[cfg(test)]
mod testing;

pub use self::{
    connector::{Connector, ConnectorState},
    events::{ConnectorEvent, EventKind, NATIVE_EVENTS, SubscriptionId},
    factory::ProviderKind,
    provider::{ExternalProvider, Signer, Web3Provider},
    wallet::{BrowserEnvironment, InjectedProvider, LedgerTransport},
};
