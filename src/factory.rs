use crate::{
    config::{LedgerOptions, Options, WalletConnectOptions},
    error::Error,
    provider::{ExternalProvider, Signer, Web3Provider},
};
use async_trait::async_trait;
use core::fmt;
use std::{rc::Rc, str::FromStr};
use wasm_bindgen::prelude::*;

/// The wallets a [`Connector`] can be built for.
///
/// [`Connector`]: crate::Connector
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderKind {
    /// Browser extension injecting `window.ethereum`
    Metamask,
    /// Hardware wallet reached over WebHID
    Ledger,
    /// Relay session with a mobile wallet
    WalletConnect,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Metamask => write!(f, "Metamask"),
            ProviderKind::Ledger => write!(f, "Ledger"),
            ProviderKind::WalletConnect => write!(f, "WalletConnect"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown provider kind `{0}'")]
pub struct UnknownProviderKind(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProviderKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Metamask" | "MetaMask" | "metamask" => Ok(ProviderKind::Metamask),
            "Ledger" | "ledger" => Ok(ProviderKind::Ledger),
            "WalletConnect" | "walletconnect" => Ok(ProviderKind::WalletConnect),
            unknown => Err(UnknownProviderKind(unknown.to_owned())),
        }
    }
}

/// What a factory hands over to the connector.
#[derive(Clone)]
pub struct ProviderBundle {
    pub provider: Web3Provider,
    pub signer: Signer,
    /// the emitter the connector listens to
    pub external: Rc<dyn ExternalProvider>,
}

impl ProviderBundle {
    /// wrap the external provider in the RPC facade and derive the signer of
    /// the first account
    pub fn wrap(external: Rc<dyn ExternalProvider>) -> Self {
        let provider = Web3Provider::new(Rc::clone(&external));
        let signer = provider.signer(0);
        Self {
            provider,
            signer,
            external,
        }
    }
}

#[async_trait(?Send)]
pub trait ProviderFactory {
    async fn create(&self) -> Result<ProviderBundle, Error>;
}

/// Where the factories look up the wallet objects.
///
/// The browser implementation is [`BrowserEnvironment`].
///
/// [`BrowserEnvironment`]: crate::BrowserEnvironment
pub trait Environment {
    /// the EIP-1193 object injected by a browser extension
    fn injected_ethereum(&self) -> Option<Rc<dyn ExternalProvider>>;

    /// create a relay session provider, `None` if the WalletConnect
    /// library is not loaded
    fn walletconnect_session(
        &self,
        options: &WalletConnectOptions,
    ) -> Result<Option<Rc<dyn ExternalProvider>>, Error>;

    /// the hardware transport, `None` if the browser has no WebHID support
    fn ledger_transport(&self, options: &LedgerOptions) -> Option<Rc<dyn ExternalProvider>>;
}

pub struct MetaMaskFactory {
    environment: Rc<dyn Environment>,
}

#[async_trait(?Send)]
impl ProviderFactory for MetaMaskFactory {
    async fn create(&self) -> Result<ProviderBundle, Error> {
        let ethereum = self
            .environment
            .injected_ethereum()
            .ok_or_else(|| Error::ProviderUnavailable("Ethereum missing".to_owned()))?;
        Ok(ProviderBundle::wrap(ethereum))
    }
}

pub struct WalletConnectFactory {
    environment: Rc<dyn Environment>,
    options: WalletConnectOptions,
}

#[async_trait(?Send)]
impl ProviderFactory for WalletConnectFactory {
    async fn create(&self) -> Result<ProviderBundle, Error> {
        let session = self
            .environment
            .walletconnect_session(&self.options)?
            .ok_or_else(|| {
                Error::ProviderUnavailable("WalletConnect provider missing".to_owned())
            })?;
        Ok(ProviderBundle::wrap(session))
    }
}

pub struct LedgerFactory {
    environment: Rc<dyn Environment>,
    options: LedgerOptions,
}

#[async_trait(?Send)]
impl ProviderFactory for LedgerFactory {
    async fn create(&self) -> Result<ProviderBundle, Error> {
        let transport = self
            .environment
            .ledger_transport(&self.options)
            .ok_or_else(|| Error::ProviderUnavailable("WebHID transport missing".to_owned()))?;
        Ok(ProviderBundle::wrap(transport))
    }
}

/// select the factory of the given kind
pub fn for_kind(
    kind: ProviderKind,
    options: &Options,
    environment: Rc<dyn Environment>,
) -> Box<dyn ProviderFactory> {
    match kind {
        ProviderKind::Metamask => Box::new(MetaMaskFactory { environment }),
        ProviderKind::WalletConnect => Box::new(WalletConnectFactory {
            environment,
            options: options.walletconnect.clone(),
        }),
        ProviderKind::Ledger => Box::new(LedgerFactory {
            environment,
            options: options.ledger.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEnvironment, FakeProvider};
    use futures::executor::block_on;

    const KINDS: [ProviderKind; 3] = [
        ProviderKind::Metamask,
        ProviderKind::Ledger,
        ProviderKind::WalletConnect,
    ];

    #[test]
    fn provider_kind_names() {
        for kind in KINDS {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
        assert_eq!(ProviderKind::Metamask.to_string(), "Metamask");
        assert_eq!("MetaMask".parse(), Ok(ProviderKind::Metamask));
        assert_eq!(
            "Trezor".parse::<ProviderKind>(),
            Err(UnknownProviderKind("Trezor".to_owned()))
        );
    }

    #[test]
    fn missing_wallets() {
        let environment: Rc<dyn Environment> = Rc::new(FakeEnvironment::default());
        let expected = [
            "Ethereum missing",
            "WebHID transport missing",
            "WalletConnect provider missing",
        ];

        for (kind, message) in KINDS.into_iter().zip(expected) {
            let factory = for_kind(kind, &Options::default(), Rc::clone(&environment));
            match block_on(factory.create()) {
                Err(Error::ProviderUnavailable(reason)) => assert_eq!(reason, message),
                Err(other) => panic!("{kind}: unexpected error {other}"),
                Ok(_) => panic!("{kind}: no wallet should be available"),
            }
        }
    }

    #[test]
    fn factories_pick_their_own_wallet() {
        let ethereum = Rc::new(FakeProvider::default());
        let walletconnect = Rc::new(FakeProvider::default());
        let ledger = Rc::new(FakeProvider::default());
        let environment: Rc<dyn Environment> = Rc::new(FakeEnvironment {
            ethereum: Some(Rc::clone(&ethereum)),
            walletconnect: Some(Rc::clone(&walletconnect)),
            ledger: Some(Rc::clone(&ledger)),
        });

        let expected: [Rc<FakeProvider>; 3] = [ethereum, ledger, walletconnect];
        for (kind, fake) in KINDS.into_iter().zip(expected) {
            let factory = for_kind(kind, &Options::default(), Rc::clone(&environment));
            let bundle = block_on(factory.create()).unwrap();
            assert!(
                std::ptr::addr_eq(Rc::as_ptr(&bundle.external), Rc::as_ptr(&fake)),
                "{kind}"
            );
            assert!(std::ptr::addr_eq(
                Rc::as_ptr(bundle.provider.external()),
                Rc::as_ptr(&fake)
            ));
        }
    }
}
