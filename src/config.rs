//! Options given to the provider factories.
//!
//! Every field has a default so JavaScript callers may pass a partial
//! object (or nothing at all).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    #[serde(rename = "walletConnect")]
    pub walletconnect: WalletConnectOptions,
    pub ledger: LedgerOptions,
}

/// Options forwarded to the WalletConnect provider constructor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletConnectOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infura_id: Option<String>,
    /// RPC endpoint per (decimal) chain id, e.g. `"1" => "https://..."`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub rpc: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// relay (bridge) server url
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
    /// display the pairing QR code modal
    pub qrcode: bool,
}

impl Default for WalletConnectOptions {
    fn default() -> Self {
        Self {
            infura_id: None,
            rpc: BTreeMap::new(),
            chain_id: None,
            bridge: None,
            qrcode: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerOptions {
    /// chain reported in the `connect` event when a device is plugged
    pub chain_id: u64,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self { chain_id: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_options() {
        let options: Options = serde_json::from_value(json! { {} }).unwrap();
        assert_eq!(options, Options::default());
        assert!(options.walletconnect.qrcode);
        assert_eq!(options.ledger.chain_id, 1);
    }

    #[test]
    fn partial_options() {
        let options: Options = serde_json::from_value(json! { {
            "walletConnect": {
                "infuraId": "0123456789abcdef",
                "rpc": { "100": "https://rpc.gnosischain.com" },
                "qrcode": false,
            },
            "ledger": { "chainId": 5 },
        }})
        .unwrap();

        assert_eq!(
            options.walletconnect.infura_id.as_deref(),
            Some("0123456789abcdef")
        );
        assert_eq!(
            options.walletconnect.rpc.get("100").map(String::as_str),
            Some("https://rpc.gnosischain.com")
        );
        assert!(!options.walletconnect.qrcode);
        assert_eq!(options.walletconnect.chain_id, None);
        assert_eq!(options.ledger.chain_id, 5);
    }

    #[test]
    fn walletconnect_constructor_arguments() {
        let options = WalletConnectOptions {
            infura_id: Some("abc".to_owned()),
            ..WalletConnectOptions::default()
        };
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json! { { "infuraId": "abc", "qrcode": true } }
        );
    }
}
