use crate::{
    BrowserEnvironment,
    config::Options,
    error::Error,
    events::{ConnectorEvent, EventHub, EventKind, NATIVE_EVENTS, SubscriptionId},
    factory::{self, Environment, ProviderBundle, ProviderFactory, ProviderKind},
    provider::{ExternalProvider, ListenerId, NativeHandler, Signer, Web3Provider},
};
use std::{cell::RefCell, fmt, rc::Rc};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorState {
    Uninitialized,
    Initializing,
    Ready,
    /// the last initialization failed, `init_provider` may be called again
    Failed,
    Disposed,
}

impl fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorState::Uninitialized => write!(f, "uninitialized"),
            ConnectorState::Initializing => write!(f, "initializing"),
            ConnectorState::Ready => write!(f, "ready"),
            ConnectorState::Failed => write!(f, "failed"),
            ConnectorState::Disposed => write!(f, "disposed"),
        }
    }
}

/// the provider in use and the native listeners attached to it
struct Attached {
    bundle: ProviderBundle,
    listeners: Vec<(&'static str, ListenerId)>,
}

enum Stage {
    Uninitialized,
    Initializing,
    Ready(Attached),
    Failed,
    Disposed,
}

impl Stage {
    fn state(&self) -> ConnectorState {
        match self {
            Stage::Uninitialized => ConnectorState::Uninitialized,
            Stage::Initializing => ConnectorState::Initializing,
            Stage::Ready(_) => ConnectorState::Ready,
            Stage::Failed => ConnectorState::Failed,
            Stage::Disposed => ConnectorState::Disposed,
        }
    }
}

/// A connection to one kind of Ethereum wallet.
///
/// The connector owns the provider and signer created by the wallet's
/// factory and re-emits the provider's events as [`ConnectorEvent`]s.
pub struct Connector {
    kind: ProviderKind,
    factory: Box<dyn ProviderFactory>,
    stage: RefCell<Stage>,
    hub: Rc<EventHub>,
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Connector {
    /// connector looking for the wallet in the current browser window
    pub fn new(kind: ProviderKind) -> Self {
        Self::with_options(kind, Options::default())
    }

    pub fn with_options(kind: ProviderKind, options: Options) -> Self {
        Self::with_environment(kind, options, Rc::new(BrowserEnvironment))
    }

    pub fn with_environment(
        kind: ProviderKind,
        options: Options,
        environment: Rc<dyn Environment>,
    ) -> Self {
        Self::with_factory(kind, factory::for_kind(kind, &options, environment))
    }

    pub fn with_factory(kind: ProviderKind, factory: Box<dyn ProviderFactory>) -> Self {
        Self {
            kind,
            factory,
            stage: RefCell::new(Stage::Uninitialized),
            hub: Rc::new(EventHub::default()),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn state(&self) -> ConnectorState {
        self.stage.borrow().state()
    }

    /// create the provider and signer and start forwarding the provider's
    /// events
    ///
    /// Once the connector is ready calling this again does nothing. After a
    /// failure it may be called again, e.g. once the user installed or
    /// unlocked their wallet.
    pub async fn init_provider(&self) -> Result<(), Error> {
        match self.state() {
            ConnectorState::Ready => {
                log::debug!("{} provider already initialized", self.kind);
                return Ok(());
            }
            ConnectorState::Initializing => return Err(Error::InitializationInProgress),
            ConnectorState::Disposed => return Err(Error::Disposed),
            ConnectorState::Uninitialized | ConnectorState::Failed => {}
        }

        *self.stage.borrow_mut() = Stage::Initializing;
        log::debug!("initializing {} provider", self.kind);

        let result = self.factory.create().await;

        if matches!(*self.stage.borrow(), Stage::Disposed) {
            return Err(Error::Disposed);
        }

        match result {
            Ok(bundle) => {
                // emitters may fire while their listeners are being added,
                // subscribers only hear of it once the connector is ready
                self.hub.hold();
                let listeners = attach(&bundle.external, &self.hub);
                *self.stage.borrow_mut() = Stage::Ready(Attached { bundle, listeners });
                log::info!("{} provider ready", self.kind);
                self.hub.release();
                Ok(())
            }
            Err(error) => {
                *self.stage.borrow_mut() = Stage::Failed;
                log::warn!("{} provider initialization failed: {error}", self.kind);
                Err(error)
            }
        }
    }

    /// request access to the user's accounts
    ///
    /// Emits [`ConnectorEvent::AccountsChanged`] with the exposed accounts
    /// and returns them. Ledger devices need no authorization, nothing is
    /// requested nor emitted for them.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let provider = self.provider()?;

        let accounts = match self.kind {
            ProviderKind::Metamask => provider.request_accounts().await?,
            ProviderKind::WalletConnect => provider.enable().await?,
            ProviderKind::Ledger => {
                log::debug!("nothing to activate for {}", self.kind);
                return Ok(Vec::new());
            }
        };

        log::info!("{} exposed {} account(s)", self.kind, accounts.len());
        self.hub
            .dispatch(&ConnectorEvent::AccountsChanged(accounts.clone()));
        Ok(accounts)
    }

    /// call `handler` every time an event of the given kind is emitted
    ///
    /// Handlers of the same kind are called in the order they subscribed.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ConnectorEvent) + 'static,
    {
        self.hub.subscribe(kind, Rc::new(handler))
    }

    /// returns `false` if there was no such subscription
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// release the provider, its listeners and every subscriber
    ///
    /// Calling it more than once is harmless. The connector cannot be used
    /// afterward.
    pub fn dispose(&self) {
        let previous = std::mem::replace(&mut *self.stage.borrow_mut(), Stage::Disposed);

        if let Stage::Ready(Attached { bundle, listeners }) = previous {
            for (event, listener) in listeners {
                bundle.external.remove_listener(event, listener);
            }
        }

        if !self.hub.is_closed() {
            self.hub.close();
            log::info!("{} connector disposed", self.kind);
        }
    }

    pub fn provider(&self) -> Result<Web3Provider, Error> {
        match &*self.stage.borrow() {
            Stage::Ready(attached) => Ok(attached.bundle.provider.clone()),
            _ => Err(Error::NotInitialized),
        }
    }

    pub fn signer(&self) -> Result<Signer, Error> {
        match &*self.stage.borrow() {
            Stage::Ready(attached) => Ok(attached.bundle.signer.clone()),
            _ => Err(Error::NotInitialized),
        }
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// register one forwarding listener per native event
///
/// The listeners only hold a weak reference on the hub: once the connector
/// is gone they do nothing.
fn attach(
    external: &Rc<dyn ExternalProvider>,
    hub: &Rc<EventHub>,
) -> Vec<(&'static str, ListenerId)> {
    NATIVE_EVENTS
        .iter()
        .map(|&(native, _)| {
            let hub = Rc::downgrade(hub);
            let handler: NativeHandler = Rc::new(move |payload: serde_json::Value| {
                if let Some(hub) = hub.upgrade() {
                    hub.forward(native, payload);
                }
            });
            (native, external.on(native, handler))
        })
        .collect()
}
