//! In-memory stand-ins for the wallet objects a browser would inject.

use crate::{
    config::{LedgerOptions, WalletConnectOptions},
    error::{Error, ProviderErrorCode, ProviderRpcError},
    factory::Environment,
    provider::{ExternalProvider, ListenerId, NativeHandler, RequestArguments},
};
use async_trait::async_trait;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

/// An EIP-1193 emitter driven by the tests.
#[derive(Default)]
pub struct FakeProvider {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(&'static str, ListenerId, NativeHandler)>>,
    responses: RefCell<HashMap<String, serde_json::Value>>,
    requests: RefCell<Vec<RequestArguments>>,
    enable_calls: Cell<usize>,
    /// payloads handed to every new listener of the event, from within `on`
    replays: RefCell<HashMap<&'static str, serde_json::Value>>,
    /// keep firing listeners even after they were removed
    ignore_removal: bool,
}

impl FakeProvider {
    pub fn deaf_to_removal() -> Self {
        Self {
            ignore_removal: true,
            ..Self::default()
        }
    }

    /// call every listener of `event` with `payload` as soon as it is added
    pub fn replay(&self, event: &'static str, payload: serde_json::Value) {
        self.replays.borrow_mut().insert(event, payload);
    }

    pub fn respond(&self, method: &str, value: serde_json::Value) {
        self.responses.borrow_mut().insert(method.to_owned(), value);
    }

    pub fn requests(&self) -> Vec<RequestArguments> {
        self.requests.borrow().clone()
    }

    pub fn enable_calls(&self) -> usize {
        self.enable_calls.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// fire the native event `event` with the given payload
    pub fn emit(&self, event: &str, payload: serde_json::Value) {
        let handlers: Vec<NativeHandler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(name, _, _)| *name == event)
            .map(|(_, _, handler)| Rc::clone(handler))
            .collect();
        for handler in handlers {
            handler(payload.clone());
        }
    }
}

#[async_trait(?Send)]
impl ExternalProvider for FakeProvider {
    fn on(&self, event: &'static str, handler: NativeHandler) -> ListenerId {
        let id = ListenerId::new(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.listeners
            .borrow_mut()
            .push((event, id, Rc::clone(&handler)));

        let replayed = self.replays.borrow().get(event).cloned();
        if let Some(payload) = replayed {
            handler(payload);
        }
        id
    }

    fn remove_listener(&self, event: &'static str, listener: ListenerId) {
        if self.ignore_removal {
            return;
        }
        self.listeners
            .borrow_mut()
            .retain(|(name, id, _)| !(*name == event && *id == listener));
    }

    async fn request(&self, args: RequestArguments) -> Result<serde_json::Value, ProviderRpcError> {
        let response = self.responses.borrow().get(&args.method).cloned();
        let method = args.method.clone();
        self.requests.borrow_mut().push(args);
        response.ok_or_else(|| {
            ProviderRpcError::new(
                ProviderErrorCode::UnsupportedMethod,
                format!("`{method}' is not supported"),
            )
        })
    }

    async fn enable(&self) -> Result<serde_json::Value, ProviderRpcError> {
        self.enable_calls.set(self.enable_calls.get() + 1);
        self.request(RequestArguments::new("eth_requestAccounts"))
            .await
    }
}

/// A browser where the wallets are whatever the test put there.
#[derive(Default)]
pub struct FakeEnvironment {
    pub ethereum: Option<Rc<FakeProvider>>,
    pub walletconnect: Option<Rc<FakeProvider>>,
    pub ledger: Option<Rc<FakeProvider>>,
}

impl Environment for FakeEnvironment {
    fn injected_ethereum(&self) -> Option<Rc<dyn ExternalProvider>> {
        self.ethereum
            .clone()
            .map(|provider| provider as Rc<dyn ExternalProvider>)
    }

    fn walletconnect_session(
        &self,
        _options: &WalletConnectOptions,
    ) -> Result<Option<Rc<dyn ExternalProvider>>, Error> {
        Ok(self
            .walletconnect
            .clone()
            .map(|provider| provider as Rc<dyn ExternalProvider>))
    }

    fn ledger_transport(&self, _options: &LedgerOptions) -> Option<Rc<dyn ExternalProvider>> {
        self.ledger
            .clone()
            .map(|provider| provider as Rc<dyn ExternalProvider>)
    }
}
