//! Ethereum payload types carried by the normalized events.

use serde::{Deserialize, Serialize};

/// chain identifiers as they are exchanged with wallets.
///
/// EIP-1193 mandates a hex-prefixed string but some providers still emit
/// the chain id as a plain number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum ChainIdRepr {
    Hex(String),
    Number(u64),
}

impl From<ChainIdRepr> for String {
    fn from(chain_id: ChainIdRepr) -> Self {
        match chain_id {
            ChainIdRepr::Hex(hex) => hex,
            ChainIdRepr::Number(number) => format!("{number:#x}"),
        }
    }
}

/// parse a hex-prefixed chain id (`"0x1"`) into its numeric value
pub fn parse_chain_id(chain_id: &str) -> Option<u64> {
    let digits = chain_id
        .strip_prefix("0x")
        .or_else(|| chain_id.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

/// Payload of the EIP-1193 `connect` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectInfo {
    pub chain_id: ChainIdRepr,
}

/// Message emitted by the provider (e.g. `eth_subscription` notifications).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Network descriptor as reported at the provider level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    #[serde(default)]
    pub name: String,
    pub chain_id: u64,
}

impl Network {
    /// build the descriptor of the given chain, naming the well known ones
    pub fn from_chain_id(chain_id: u64) -> Self {
        let name = match chain_id {
            1 => "homestead",
            5 => "goerli",
            10 => "optimism",
            56 => "bnb",
            100 => "xdai",
            137 => "matic",
            8453 => "base",
            42161 => "arbitrum",
            80001 => "maticmum",
            11155111 => "sepolia",
            _ => "unknown",
        };
        Self {
            name: name.to_owned(),
            chain_id,
        }
    }

    /// the chain id in its hex-prefixed form
    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}
