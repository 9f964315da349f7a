use crate::{
    error::{Error, ProviderRpcError},
    ethereum::{ChainIdRepr, Network, parse_chain_id},
};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt, rc::Rc};

/// Callback registered on a native provider event, receives the raw payload.
pub type NativeHandler = Rc<dyn Fn(serde_json::Value)>;

/// Identifies a listener registered with [`ExternalProvider::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Arguments of an EIP-1193 `request` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestArguments {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl RequestArguments {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// The wallet object as supplied by the extension, device or relay, before
/// it is wrapped into a [`Web3Provider`].
///
/// The only thing the connector relies on to receive events is
/// [`ExternalProvider::on`]; the payloads are handed over untouched.
#[async_trait(?Send)]
pub trait ExternalProvider {
    /// register `handler` to be called every time the native event `event`
    /// fires.
    fn on(&self, event: &'static str, handler: NativeHandler) -> ListenerId;

    /// remove a listener previously registered with [`ExternalProvider::on`].
    /// Unknown listeners are ignored.
    fn remove_listener(&self, event: &'static str, listener: ListenerId);

    async fn request(&self, args: RequestArguments) -> Result<serde_json::Value, ProviderRpcError>;

    /// the legacy `enable` handshake, prompting the user to expose accounts
    ///
    /// Providers without a dedicated handshake fall back on
    /// `eth_requestAccounts`.
    async fn enable(&self) -> Result<serde_json::Value, ProviderRpcError> {
        self.request(RequestArguments::new("eth_requestAccounts"))
            .await
    }
}

/// Standard RPC facade over an [`ExternalProvider`].
#[derive(Clone)]
pub struct Web3Provider {
    external: Rc<dyn ExternalProvider>,
}

impl fmt::Debug for Web3Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Web3Provider").finish_non_exhaustive()
    }
}

impl Web3Provider {
    pub fn new(external: Rc<dyn ExternalProvider>) -> Self {
        Self { external }
    }

    pub fn external(&self) -> &Rc<dyn ExternalProvider> {
        &self.external
    }

    /// send a JSON-RPC request through the wallet and decode the result
    pub async fn request<R>(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let args = RequestArguments {
            method: method.to_owned(),
            params,
        };
        let value = self.external.request(args).await?;
        decode(method, value)
    }

    /// list the accounts already exposed to the application, without
    /// prompting the user
    pub async fn accounts(&self) -> Result<Vec<String>, Error> {
        self.request("eth_accounts", None).await
    }

    /// prompt the user to expose their accounts
    pub async fn request_accounts(&self) -> Result<Vec<String>, Error> {
        self.request("eth_requestAccounts", None).await
    }

    /// run the provider's `enable` handshake
    pub async fn enable(&self) -> Result<Vec<String>, Error> {
        let value = self.external.enable().await?;
        decode("enable", value)
    }

    /// the hex-prefixed chain id the wallet is currently on
    pub async fn chain_id(&self) -> Result<String, Error> {
        let chain_id: ChainIdRepr = self.request("eth_chainId", None).await?;
        Ok(chain_id.into())
    }

    pub async fn network(&self) -> Result<Network, Error> {
        let chain_id = self.chain_id().await?;
        let chain_id = parse_chain_id(&chain_id).ok_or_else(|| Error::InvalidResponse {
            method: "eth_chainId".to_owned(),
            source: serde::de::Error::custom(format!("invalid chain id `{chain_id}'")),
        })?;
        Ok(Network::from_chain_id(chain_id))
    }

    /// the signer of the account at `index` in the wallet's account list
    pub fn signer(&self, index: usize) -> Signer {
        Signer {
            provider: self.clone(),
            index,
        }
    }
}

fn decode<R: DeserializeOwned>(method: &str, value: serde_json::Value) -> Result<R, Error> {
    serde_json::from_value(value).map_err(|source| Error::InvalidResponse {
        method: method.to_owned(),
        source,
    })
}

/// Signing capability of one wallet account.
///
/// Nothing is signed locally, every operation is delegated to the wallet.
#[derive(Debug, Clone)]
pub struct Signer {
    provider: Web3Provider,
    index: usize,
}

impl Signer {
    pub fn provider(&self) -> &Web3Provider {
        &self.provider
    }

    pub async fn address(&self) -> Result<String, Error> {
        let accounts = self.provider.accounts().await?;
        accounts
            .into_iter()
            .nth(self.index)
            .ok_or_else(|| Error::InvalidResponse {
                method: "eth_accounts".to_owned(),
                source: serde::de::Error::custom(format!("no account at index {}", self.index)),
            })
    }

    /// ask the wallet to sign `message` with `personal_sign`, returns the
    /// hex-prefixed signature
    pub async fn sign_message(&self, message: impl AsRef<[u8]>) -> Result<String, Error> {
        let address = self.address().await?;
        // personal_sign expects the message hex encoded
        let data = format!("0x{}", hex::encode(message));
        self.provider
            .request(
                "personal_sign",
                Some(serde_json::json!([data, address.to_lowercase()])),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ProviderErrorCode, testing::FakeProvider};
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn request_arguments_json() {
        assert_eq!(
            serde_json::to_value(RequestArguments::new("eth_accounts")).unwrap(),
            json! { { "method": "eth_accounts" } }
        );
        assert_eq!(
            serde_json::to_value(RequestArguments::new("eth_getBalance").with_params(json! {
                ["0xabc", "latest"]
            }))
            .unwrap(),
            json! { { "method": "eth_getBalance", "params": ["0xabc", "latest"] } }
        );
    }

    #[test]
    fn chain_id_and_network() {
        let fake = Rc::new(FakeProvider::default());
        fake.respond("eth_chainId", json! { "0xaa36a7" });
        let provider = Web3Provider::new(fake);

        assert_eq!(block_on(provider.chain_id()).unwrap(), "0xaa36a7");
        assert_eq!(
            block_on(provider.network()).unwrap(),
            Network::from_chain_id(11155111)
        );
    }

    #[test]
    fn unexpected_response() {
        let fake = Rc::new(FakeProvider::default());
        fake.respond("eth_accounts", json! { { "not": "a list" } });
        let provider = Web3Provider::new(fake);

        assert!(matches!(
            block_on(provider.accounts()),
            Err(Error::InvalidResponse { method, .. }) if method == "eth_accounts"
        ));
    }

    #[test]
    fn rpc_errors_are_propagated() {
        let provider = Web3Provider::new(Rc::new(FakeProvider::default()));

        match block_on(provider.chain_id()) {
            Err(Error::Rpc(error)) => assert_eq!(error.code, ProviderErrorCode::UnsupportedMethod),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn signer_delegates_personal_sign() {
        let fake = Rc::new(FakeProvider::default());
        fake.respond("eth_accounts", json! { ["0xABC", "0xDEF"] });
        fake.respond("personal_sign", json! { "0x5167" });
        let signer = Web3Provider::new(fake.clone()).signer(1);

        assert_eq!(block_on(signer.address()).unwrap(), "0xDEF");
        assert_eq!(block_on(signer.sign_message(b"hi")).unwrap(), "0x5167");
        assert_eq!(
            fake.requests().last().cloned(),
            Some(RequestArguments::new("personal_sign").with_params(json! { ["0x6869", "0xdef"] }))
        );
    }

    #[test]
    fn signer_without_account() {
        let fake = Rc::new(FakeProvider::default());
        fake.respond("eth_accounts", json! { [] });
        let signer = Web3Provider::new(fake).signer(0);

        assert!(matches!(
            block_on(signer.address()),
            Err(Error::InvalidResponse { .. })
        ));
    }
}
