use crate::{
    config::{LedgerOptions, WalletConnectOptions},
    error::{Error, ProviderErrorCode, ProviderRpcError},
    factory::Environment,
    ffi::{
        self,
        webhid::{HidConnectionEvent, LEDGER_VENDOR_ID},
    },
    provider::{ExternalProvider, ListenerId, NativeHandler, RequestArguments},
};
use async_trait::async_trait;
use serde::Serialize as _;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};

/// Looks the wallets up in the current browser window.
///
/// Wallet extensions inject their objects asynchronously: make sure the page
/// is fully loaded before initializing a connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserEnvironment;

impl Environment for BrowserEnvironment {
    fn injected_ethereum(&self) -> Option<Rc<dyn ExternalProvider>> {
        // refresh from window.ethereum in case it was injected after the
        // initial check
        let ethereum = lookup(&js_sys::global(), &["window", "ethereum"]).or_else(|| {
            ffi::eip1193::ETHEREUM.with(|ethereum| ethereum.clone().map(JsValue::from))
        })?;

        let ethereum = prefer_metamask(ethereum);
        if !looks_like_eip1193_provider(&ethereum) {
            log::warn!("window.ethereum is not an EIP-1193 provider");
            return None;
        }

        Some(Rc::new(InjectedProvider::new(ethereum.unchecked_into())))
    }

    fn walletconnect_session(
        &self,
        options: &WalletConnectOptions,
    ) -> Result<Option<Rc<dyn ExternalProvider>>, Error> {
        let Some(mut constructor) = lookup(&js_sys::global(), &["window", "WalletConnectProvider"])
        else {
            return Ok(None);
        };
        // the UMD bundle exposes the class as `default`
        if let Some(default) = lookup(&constructor, &["default"]) {
            constructor = default;
        }
        let Some(constructor) = constructor.dyn_ref::<js_sys::Function>() else {
            return Ok(None);
        };

        let arguments = options
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|error| {
                ProviderRpcError::new(
                    ProviderErrorCode::InvalidParams,
                    format!("Couldn't encode the WalletConnect options: {error}"),
                )
            })?;
        let session = js_sys::Reflect::construct(constructor, &js_sys::Array::of1(&arguments))
            .map_err(ProviderRpcError::from_js)?;

        Ok(Some(Rc::new(InjectedProvider::new(session.unchecked_into()))))
    }

    fn ledger_transport(&self, options: &LedgerOptions) -> Option<Rc<dyn ExternalProvider>> {
        let hid = lookup(&js_sys::global(), &["navigator", "hid"])?;
        Some(Rc::new(LedgerTransport::new(
            hid.unchecked_into(),
            options.chain_id,
        )))
    }
}

/// walk `path` down from `root`, `None` if any step is missing
fn lookup(root: &JsValue, path: &[&str]) -> Option<JsValue> {
    path.iter().try_fold(root.clone(), |value, key| {
        js_sys::Reflect::get(&value, &JsValue::from_str(key))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
    })
}

fn has_function_property(value: &JsValue, prop: &str) -> bool {
    js_sys::Reflect::get(value, &JsValue::from_str(prop))
        .ok()
        .map(|v| v.is_function())
        .unwrap_or(false)
}

fn looks_like_eip1193_provider(value: &JsValue) -> bool {
    value.is_object() && has_function_property(value, "request")
}

/// When several extensions are installed they may list themselves in
/// `window.ethereum.providers`; pick MetaMask's if it is there.
fn prefer_metamask(ethereum: JsValue) -> JsValue {
    let Some(providers) = lookup(&ethereum, &["providers"]) else {
        return ethereum;
    };
    if !js_sys::Array::is_array(&providers) {
        return ethereum;
    }

    js_sys::Array::from(&providers)
        .iter()
        .find(|provider| {
            looks_like_eip1193_provider(provider)
                && provider
                    .unchecked_ref::<ffi::Eip1193Provider>()
                    .is_metamask()
                    .unwrap_or(false)
        })
        .unwrap_or(ethereum)
}

/// closures handed over to JavaScript, kept alive until removed
#[derive(Default)]
struct Listeners {
    next_id: Cell<u64>,
    closures: RefCell<HashMap<ListenerId, Closure<dyn FnMut(JsValue)>>>,
}

impl Listeners {
    fn next_id(&self) -> ListenerId {
        let id = ListenerId::new(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        id
    }

    fn register(
        &self,
        closure: Closure<dyn FnMut(JsValue)>,
        attach: impl FnOnce(&js_sys::Function),
    ) -> ListenerId {
        attach(closure.as_ref().unchecked_ref());

        let id = self.next_id();
        self.closures.borrow_mut().insert(id, closure);
        id
    }

    fn remove(&self, listener: ListenerId, detach: impl FnOnce(&js_sys::Function)) {
        let closure = self.closures.borrow_mut().remove(&listener);
        if let Some(closure) = closure {
            detach(closure.as_ref().unchecked_ref());
        }
    }
}

/// An EIP-1193 object living on the JavaScript side.
pub struct InjectedProvider {
    inner: ffi::Eip1193Provider,
    listeners: Listeners,
}

impl InjectedProvider {
    pub fn new(inner: ffi::Eip1193Provider) -> Self {
        Self {
            inner,
            listeners: Listeners::default(),
        }
    }

    fn decode_result(method: &str, value: JsValue) -> Result<serde_json::Value, ProviderRpcError> {
        serde_wasm_bindgen::from_value(value).map_err(|decode_error| {
            ProviderRpcError::new(
                ProviderErrorCode::Internal,
                format!("Couldn't decode the result of `{method}': {decode_error}"),
            )
        })
    }
}

#[async_trait(?Send)]
impl ExternalProvider for InjectedProvider {
    fn on(&self, event: &'static str, handler: NativeHandler) -> ListenerId {
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
            match serde_wasm_bindgen::from_value::<serde_json::Value>(payload) {
                Ok(payload) => handler(payload),
                Err(error) => log::warn!("Couldn't decode the `{event}' payload: {error}"),
            }
        });

        // some providers are not event emitters at all
        let emitter = has_function_property(&self.inner, "on");
        if !emitter {
            log::debug!("provider has no `on', `{event}' will never fire");
        }
        self.listeners.register(closure, |listener| {
            if emitter {
                self.inner.on(event, listener)
            }
        })
    }

    fn remove_listener(&self, event: &'static str, listener: ListenerId) {
        let removable = has_function_property(&self.inner, "removeListener");
        self.listeners.remove(listener, |listener| {
            if removable {
                self.inner.remove_listener(event, listener)
            }
        })
    }

    async fn request(&self, args: RequestArguments) -> Result<serde_json::Value, ProviderRpcError> {
        let js_args = args
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|error| {
                ProviderRpcError::new(
                    ProviderErrorCode::InvalidParams,
                    format!("Couldn't encode the request: {error}"),
                )
            })?;

        match self.inner.request(js_args).await {
            Ok(value) => Self::decode_result(&args.method, value),
            Err(error) => Err(ProviderRpcError::from_js(error)),
        }
    }

    async fn enable(&self) -> Result<serde_json::Value, ProviderRpcError> {
        if !has_function_property(&self.inner, "enable") {
            return self
                .request(RequestArguments::new("eth_requestAccounts"))
                .await;
        }

        match self.inner.enable().await {
            Ok(value) => Self::decode_result("enable", value),
            Err(error) => Err(ProviderRpcError::from_js(error)),
        }
    }
}

/// Ledger devices reached through WebHID.
///
/// The transport only reports devices being plugged (`connect`) and
/// unplugged (`disconnect`). Talking to the device is left to the Ledger
/// libraries, every request is answered with
/// [`ProviderErrorCode::UnsupportedMethod`].
pub struct LedgerTransport {
    hid: ffi::Hid,
    chain_id: u64,
    listeners: Listeners,
}

impl LedgerTransport {
    pub fn new(hid: ffi::Hid, chain_id: u64) -> Self {
        Self {
            hid,
            chain_id,
            listeners: Listeners::default(),
        }
    }
}

fn is_ledger(event: &JsValue) -> bool {
    lookup(event, &["device"]).is_some()
        && event
            .unchecked_ref::<HidConnectionEvent>()
            .device()
            .vendor_id()
            == LEDGER_VENDOR_ID
}

/// what the transport emits for `event` when a Ledger device is plugged or
/// unplugged, `None` for the events it never emits
fn ledger_payload(event: &str, chain_id: u64) -> Option<serde_json::Value> {
    match event {
        "connect" => Some(serde_json::json!({ "chainId": format!("{chain_id:#x}") })),
        "disconnect" => serde_json::to_value(ProviderRpcError::new(
            ProviderErrorCode::Disconnected,
            "Ledger device disconnected",
        ))
        .ok(),
        _ => None,
    }
}

#[async_trait(?Send)]
impl ExternalProvider for LedgerTransport {
    fn on(&self, event: &'static str, handler: NativeHandler) -> ListenerId {
        let Some(payload) = ledger_payload(event, self.chain_id) else {
            log::debug!("the Ledger transport never emits `{event}'");
            return self.listeners.next_id();
        };

        let closure = Closure::<dyn FnMut(JsValue)>::new(move |hid_event: JsValue| {
            if is_ledger(&hid_event) {
                handler(payload.clone())
            }
        });
        self.listeners
            .register(closure, |listener| self.hid.add_event_listener(event, listener))
    }

    fn remove_listener(&self, event: &'static str, listener: ListenerId) {
        self.listeners.remove(listener, |listener| {
            self.hid.remove_event_listener(event, listener)
        })
    }

    async fn request(&self, args: RequestArguments) -> Result<serde_json::Value, ProviderRpcError> {
        Err(ProviderRpcError::new(
            ProviderErrorCode::UnsupportedMethod,
            format!("`{}' is not supported by the Ledger transport", args.method),
        ))
    }
}
