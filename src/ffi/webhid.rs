use wasm_bindgen::prelude::*;

/// USB vendor id of Ledger devices
pub const LEDGER_VENDOR_ID: u16 = 0x2c97;

#[wasm_bindgen]
extern "C" {
    /// `navigator.hid`, see the [WebHID API](https://wicg.github.io/webhid/)
    #[derive(Clone, PartialEq)]
    pub type Hid;

    /// listen to `connect` / `disconnect`, fired when a device the page was
    /// granted access to is plugged or unplugged.
    #[wasm_bindgen(method, js_name = "addEventListener")]
    pub fn add_event_listener(this: &Hid, kind: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = "removeEventListener")]
    pub fn remove_event_listener(this: &Hid, kind: &str, listener: &js_sys::Function);
}

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, PartialEq)]
    pub type HidConnectionEvent;

    #[wasm_bindgen(method, getter)]
    pub fn device(this: &HidConnectionEvent) -> HidDevice;

    #[derive(Clone, PartialEq)]
    pub type HidDevice;

    #[wasm_bindgen(method, getter, js_name = "vendorId")]
    pub fn vendor_id(this: &HidDevice) -> u16;

    #[wasm_bindgen(method, getter, js_name = "productName")]
    pub fn product_name(this: &HidDevice) -> String;
}
