//! The [`Connector`] as seen from JavaScript.
//!
//! ```js
//! const connector = new Connector(ProviderKind.Metamask);
//! connector.addEventListener(EventKind.AccountsChanged, ({ detail }) => console.log(detail));
//! await connector.initProvider();
//! await connector.activate();
//! ```

use crate::{
    Connector, ConnectorState, EventKind, ProviderKind, config::Options, error::Error,
    events::SubscriptionId,
};
use serde::Serialize as _;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_name = "Connector")]
pub struct JsConnector {
    connector: Rc<Connector>,
}

#[wasm_bindgen(js_class = "Connector")]
impl JsConnector {
    /// `options` may be omitted, see [`Options`] for the accepted fields.
    #[wasm_bindgen(constructor)]
    pub fn new(kind: ProviderKind, options: JsValue) -> Result<JsConnector, JsError> {
        let options: Options = if options.is_undefined() || options.is_null() {
            Options::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|error| JsError::new(&format!("Invalid connector options: {error}")))?
        };

        Ok(Self {
            connector: Rc::new(Connector::with_options(kind, options)),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> ProviderKind {
        self.connector.kind()
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> ConnectorState {
        self.connector.state()
    }

    #[wasm_bindgen(js_name = "initProvider")]
    pub fn init_provider(&self) -> js_sys::Promise {
        let connector = Rc::clone(&self.connector);
        wasm_bindgen_futures::future_to_promise(async move {
            connector.init_provider().await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// resolves with the exposed accounts
    pub fn activate(&self) -> js_sys::Promise {
        let connector = Rc::clone(&self.connector);
        wasm_bindgen_futures::future_to_promise(async move {
            let accounts = connector.activate().await.map_err(to_js_error)?;
            serde_wasm_bindgen::to_value(&accounts).map_err(JsValue::from)
        })
    }

    /// `callback` receives `{ type, detail }`. Returns the id to give to
    /// `removeEventListener`.
    #[wasm_bindgen(js_name = "addEventListener")]
    pub fn add_event_listener(&self, kind: EventKind, callback: js_sys::Function) -> u32 {
        let id = self.connector.subscribe(kind, move |event| {
            let serializer = serde_wasm_bindgen::Serializer::json_compatible();
            let event = match event.serialize(&serializer) {
                Ok(event) => event,
                Err(error) => {
                    log::error!("Couldn't encode the {} event: {error}", event.kind());
                    return;
                }
            };
            if let Err(error) = callback.call1(&JsValue::NULL, &event) {
                log::error!("event listener failed: {error:?}");
            }
        });
        id.get()
    }

    #[wasm_bindgen(js_name = "removeEventListener")]
    pub fn remove_event_listener(&self, id: u32) -> bool {
        self.connector.unsubscribe(SubscriptionId::from(id))
    }

    pub fn dispose(&self) {
        self.connector.dispose()
    }
}

fn to_js_error(error: Error) -> JsValue {
    JsError::new(&error.to_string()).into()
}
