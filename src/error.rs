use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The wallet object this connector expects was not found, e.g. the
    /// browser extension is not installed or is locked.
    #[error("{0}")]
    ProviderUnavailable(String),
    #[error("Provider has not been initialized, call initProvider() first")]
    NotInitialized,
    #[error("Provider initialization is already in progress")]
    InitializationInProgress,
    #[error("Connector has been disposed")]
    Disposed,
    #[error(transparent)]
    Rpc(#[from] ProviderRpcError),
    #[error("Unexpected response to `{method}': {source}")]
    InvalidResponse {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Error codes defined by EIP-1193, plus the JSON-RPC codes wallets
/// commonly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum ProviderErrorCode {
    #[error("The user rejected the request.")]
    UserRejectedRequest,
    #[error("The requested method and/or account has not been authorized by the user.")]
    Unauthorized,
    #[error("The provider does not support the requested method.")]
    UnsupportedMethod,
    /// If this error happens we might need to call `init_provider` again.
    #[error("The provider is disconnected from all chains.")]
    Disconnected,
    #[error("The provider is not connected to the requested chain.")]
    ChainDisconnected,
    #[error("Invalid method parameter(s).")]
    InvalidParams,
    #[error("Internal JSON-RPC error.")]
    Internal,
    #[error("Unknown error code `{0}'")]
    Unknown(i64),
}

impl ProviderErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            ProviderErrorCode::UserRejectedRequest => 4001,
            ProviderErrorCode::Unauthorized => 4100,
            ProviderErrorCode::UnsupportedMethod => 4200,
            ProviderErrorCode::Disconnected => 4900,
            ProviderErrorCode::ChainDisconnected => 4901,
            ProviderErrorCode::InvalidParams => -32602,
            ProviderErrorCode::Internal => -32603,
            ProviderErrorCode::Unknown(code) => *code,
        }
    }
}

impl From<i64> for ProviderErrorCode {
    fn from(code: i64) -> Self {
        match code {
            4001 => ProviderErrorCode::UserRejectedRequest,
            4100 => ProviderErrorCode::Unauthorized,
            4200 => ProviderErrorCode::UnsupportedMethod,
            4900 => ProviderErrorCode::Disconnected,
            4901 => ProviderErrorCode::ChainDisconnected,
            -32602 => ProviderErrorCode::InvalidParams,
            -32603 => ProviderErrorCode::Internal,
            unknown => ProviderErrorCode::Unknown(unknown),
        }
    }
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    thiserror::Error,
    serde::Deserialize,
    serde::Serialize,
)]
#[error("{code} {message}")]
pub struct ProviderRpcError {
    pub code: ProviderErrorCode,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ProviderRpcError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// decode an error thrown (or a promise rejected) by a JavaScript
    /// provider object
    ///
    /// Values that do not look like an EIP-1193 error are reported as
    /// [`ProviderErrorCode::Internal`] with their debug rendering.
    pub fn from_js(error: JsValue) -> Self {
        serde_wasm_bindgen::from_value(error.clone()).unwrap_or_else(|decode_error| Self {
            code: ProviderErrorCode::Internal,
            message: format!("Couldn't decode the error content: {decode_error} ({error:?})"),
            data: None,
        })
    }
}

impl<'de> serde::Deserialize<'de> for ProviderErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = ProviderErrorCode;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "Expecting an integer ProviderErrorCode")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ProviderErrorCode::from(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(v)
                    .map(ProviderErrorCode::from)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Unsigned(v), &self))
            }

            // javascript numbers
            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                    Ok(ProviderErrorCode::from(v as i64))
                } else {
                    Err(E::invalid_value(serde::de::Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_i64(Visitor)
    }
}

impl serde::Serialize for ProviderErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.code())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn provider_error_code_json() {
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4001 }).unwrap(),
            ProviderErrorCode::UserRejectedRequest
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4100 }).unwrap(),
            ProviderErrorCode::Unauthorized
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4200 }).unwrap(),
            ProviderErrorCode::UnsupportedMethod
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4900 }).unwrap(),
            ProviderErrorCode::Disconnected
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4901 }).unwrap(),
            ProviderErrorCode::ChainDisconnected
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { -32603 }).unwrap(),
            ProviderErrorCode::Internal
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 42 }).unwrap(),
            ProviderErrorCode::Unknown(42)
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4001.0 }).unwrap(),
            ProviderErrorCode::UserRejectedRequest
        );
        assert!(serde_json::from_value::<ProviderErrorCode>(json! { "4001" }).is_err());
    }

    #[test]
    fn provider_rpc_error_json() {
        assert_eq!(
            serde_json::from_value::<ProviderRpcError>(json! { {
                "code": 4001,
                "message": "User rejected the request.",
            }})
            .unwrap(),
            ProviderRpcError::new(
                ProviderErrorCode::UserRejectedRequest,
                "User rejected the request."
            )
        );

        assert_eq!(
            serde_json::from_value::<ProviderRpcError>(json! { {
                "code": 4900,
                "message": "Disconnected",
                "data": { "reason": "socket closed" },
            }})
            .unwrap(),
            ProviderRpcError {
                code: ProviderErrorCode::Disconnected,
                message: "Disconnected".to_owned(),
                data: Some(json! { { "reason": "socket closed" } }),
            }
        );

        assert_eq!(
            serde_json::to_value(ProviderRpcError::new(
                ProviderErrorCode::UnsupportedMethod,
                "nope"
            ))
            .unwrap(),
            json! { { "code": 4200, "message": "nope" } }
        );
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            Error::ProviderUnavailable("Ethereum missing".to_owned()).to_string(),
            "Ethereum missing"
        );
        assert_eq!(
            Error::NotInitialized.to_string(),
            "Provider has not been initialized, call initProvider() first"
        );
    }
}
