use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(thread_local_v2, js_namespace = ["window"], js_name = "ethereum")]
    pub static ETHEREUM: Option<Eip1193Provider>;
}

#[wasm_bindgen]
extern "C" {
    /// An [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193) provider, as
    /// injected by browser extensions or built by the WalletConnect library.
    #[derive(Clone, PartialEq)]
    pub type Eip1193Provider;

    /// Submit a JSON-RPC request `{ method, params }` through the wallet.
    /// The returned promise rejects with a `ProviderRpcError` (e.g. code
    /// `4001` when the user declines).
    #[wasm_bindgen(method, catch)]
    pub async fn request(this: &Eip1193Provider, args: JsValue) -> Result<JsValue, JsValue>;

    /// Legacy handshake prompting the user to expose their accounts. Still
    /// the entry point of WalletConnect v1 sessions: it opens the pairing
    /// QR code and resolves once the mobile wallet approved the session.
    #[wasm_bindgen(method, catch)]
    pub async fn enable(this: &Eip1193Provider) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method)]
    pub fn on(this: &Eip1193Provider, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = "removeListener")]
    pub fn remove_listener(this: &Eip1193Provider, event: &str, listener: &js_sys::Function);

    /// Set by MetaMask. Other extensions sometimes set it too.
    #[wasm_bindgen(method, getter, js_name = "isMetaMask")]
    pub fn is_metamask(this: &Eip1193Provider) -> Option<bool>;
}
