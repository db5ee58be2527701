use js_sys::wasm_bindgen::JsValue;
use medizap::MedizapError;
use serde::{Serialize, de::DeserializeOwned};

/// Error type for serialization/deserialization operations
#[derive(Debug)]
pub enum Error {
    SerdeWasmBindgen(serde_wasm_bindgen::Error),
    JsSys(JsValue),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::SerdeWasmBindgen(e) => write!(f, "Serde WASM Bindgen Error: {}", e),
            Error::JsSys(v) => write!(f, "JS Sys Error: {:?}", v),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Error::SerdeWasmBindgen(e)
    }
}

impl From<Error> for MedizapError {
    fn from(e: Error) -> Self {
        MedizapError::serialization(e.to_string())
    }
}

/// Serialize a Rust data structure into a JsValue
///
/// Timestamps are plain millisecond numbers on the JS side, so large integers
/// stay numbers instead of BigInt. `None` becomes `null` (Firestore rejects `undefined`).
pub fn to_value<T: Serialize>(value: &T) -> Result<JsValue, Error> {
    let serializer = serde_wasm_bindgen::Serializer::new()
        .serialize_large_number_types_as_bigints(false)
        .serialize_missing_as_null(true);
    value.serialize(&serializer).map_err(Error::from)
}

/// Deserialize a JsValue into a Rust data structure
pub fn from_value<T: DeserializeOwned>(value: JsValue) -> Result<T, Error> {
    serde_wasm_bindgen::from_value(value).map_err(Error::from)
}

/// Convert a JS document into a `serde_json::Value` via JSON.stringify
///
/// Used for reminder documents whose extra fields are kept verbatim.
pub fn to_json(value: &JsValue) -> Result<serde_json::Value, Error> {
    let text = js_sys::JSON::stringify(value)
        .map_err(Error::JsSys)?
        .as_string()
        .ok_or_else(|| Error::JsSys(JsValue::from_str("JSON.stringify returned non-string")))?;
    serde_json::from_str(&text).map_err(|e| Error::JsSys(JsValue::from_str(&e.to_string())))
}
