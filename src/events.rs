use crate::{
    error::ProviderRpcError,
    ethereum::{ChainIdRepr, ConnectInfo, Network, ProviderMessage},
};
use serde::Serialize;
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};
use wasm_bindgen::prelude::*;

/// The kinds of events a [`Connector`] emits.
///
/// [`Connector`]: crate::Connector
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    AccountsChanged,
    Connect,
    Disconnect,
    ChainChanged,
    NetworkChanged,
    Message,
}

/// Native event name to normalized kind. Applied as-is to every provider,
/// whichever factory produced it.
pub const NATIVE_EVENTS: [(&str, EventKind); 6] = [
    ("connect", EventKind::Connect),
    ("disconnect", EventKind::Disconnect),
    ("accountsChanged", EventKind::AccountsChanged),
    ("chainChanged", EventKind::ChainChanged),
    ("message", EventKind::Message),
    ("network", EventKind::NetworkChanged),
];

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::AccountsChanged,
        EventKind::Connect,
        EventKind::Disconnect,
        EventKind::ChainChanged,
        EventKind::NetworkChanged,
        EventKind::Message,
    ];

    /// the kind a native provider event is normalized into, if any
    pub fn from_native(native: &str) -> Option<Self> {
        NATIVE_EVENTS
            .iter()
            .find(|(name, _)| *name == native)
            .map(|(_, kind)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AccountsChanged => "AccountsChanged",
            EventKind::Connect => "Connect",
            EventKind::Disconnect => "Disconnect",
            EventKind::ChainChanged => "ChainChanged",
            EventKind::NetworkChanged => "NetworkChanged",
            EventKind::Message => "Message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized event.
///
/// Subscribers only ever see one of these, never the payload the
/// underlying provider emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "detail")]
pub enum ConnectorEvent {
    AccountsChanged(Vec<String>),
    /// hex-prefixed chain id the provider connected to
    Connect(String),
    Disconnect(ProviderRpcError),
    /// hex-prefixed chain id
    ChainChanged(String),
    NetworkChanged(Network),
    Message(ProviderMessage),
}

impl ConnectorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ConnectorEvent::AccountsChanged(_) => EventKind::AccountsChanged,
            ConnectorEvent::Connect(_) => EventKind::Connect,
            ConnectorEvent::Disconnect(_) => EventKind::Disconnect,
            ConnectorEvent::ChainChanged(_) => EventKind::ChainChanged,
            ConnectorEvent::NetworkChanged(_) => EventKind::NetworkChanged,
            ConnectorEvent::Message(_) => EventKind::Message,
        }
    }

    /// narrow the payload of a native event into the event of the given kind
    pub fn narrow(kind: EventKind, payload: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EventKind::AccountsChanged => Self::AccountsChanged(serde_json::from_value(payload)?),
            EventKind::Connect => {
                let ConnectInfo { chain_id } = serde_json::from_value(payload)?;
                Self::Connect(chain_id.into())
            }
            EventKind::Disconnect => Self::Disconnect(serde_json::from_value(payload)?),
            EventKind::ChainChanged => {
                Self::ChainChanged(serde_json::from_value::<ChainIdRepr>(payload)?.into())
            }
            EventKind::NetworkChanged => Self::NetworkChanged(serde_json::from_value(payload)?),
            EventKind::Message => Self::Message(serde_json::from_value(payload)?),
        })
    }
}

/// Identifies one subscription, returned by [`Connector::subscribe`].
///
/// [`Connector::subscribe`]: crate::Connector::subscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u32);

impl SubscriptionId {
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl From<u32> for SubscriptionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

pub(crate) type Handler = Rc<dyn Fn(&ConnectorEvent)>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    handler: Handler,
}

/// Subscribers of one connector.
///
/// Subscriptions are kept in insertion order, which is also the order they
/// are invoked in. Once closed the hub drops every subscriber and ignores
/// any further dispatch or subscription.
#[derive(Default)]
pub(crate) struct EventHub {
    next_id: Cell<u32>,
    subscriptions: RefCell<Vec<Subscription>>,
    /// events queued between `hold` and `release`
    held: RefCell<Option<Vec<ConnectorEvent>>>,
    closed: Cell<bool>,
}

impl EventHub {
    pub fn subscribe(&self, kind: EventKind, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));

        if self.closed.get() {
            log::debug!("subscription {id:?} to {kind} on a disposed connector");
            return id;
        }

        self.subscriptions
            .borrow_mut()
            .push(Subscription { id, kind, handler });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != id);
        before != subscriptions.len()
    }

    /// deliver the event to the subscribers of its kind
    ///
    /// The handler list is snapshotted first so handlers may (un)subscribe
    /// while being invoked; changes apply to the next dispatch.
    pub fn dispatch(&self, event: &ConnectorEvent) {
        if self.closed.get() {
            return;
        }

        if let Some(held) = self.held.borrow_mut().as_mut() {
            held.push(event.clone());
            return;
        }

        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|subscription| subscription.kind == kind)
            .map(|subscription| Rc::clone(&subscription.handler))
            .collect();

        log::debug!("dispatching {kind} to {} subscriber(s)", handlers.len());
        for handler in handlers {
            handler(event);
        }
    }

    /// normalize a native event and dispatch it
    pub fn forward(&self, native: &str, payload: serde_json::Value) {
        let Some(kind) = EventKind::from_native(native) else {
            log::debug!("ignoring unknown native event `{native}'");
            return;
        };

        match ConnectorEvent::narrow(kind, payload) {
            Ok(event) => self.dispatch(&event),
            Err(error) => {
                log::warn!("dropping native `{native}' event with malformed payload: {error}")
            }
        }
    }

    /// queue the events dispatched from now on instead of delivering them
    pub fn hold(&self) {
        self.held.borrow_mut().get_or_insert_with(Vec::new);
    }

    /// deliver the queued events, in order, and stop queueing
    pub fn release(&self) {
        let held = self.held.borrow_mut().take();
        for event in held.into_iter().flatten() {
            self.dispatch(&event);
        }
    }

    pub fn close(&self) {
        self.closed.set(true);
        self.held.borrow_mut().take();
        self.subscriptions.borrow_mut().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}
