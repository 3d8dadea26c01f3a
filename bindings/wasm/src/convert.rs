//! JSON bridging between `JsValue` and `serde_json::Value`.
//!
//! Values cross through `JSON.stringify`/`JSON.parse`, so anything that does
//! not survive a JSON round trip (functions, `undefined` members, cycles) is
//! dropped or rejected here, before it reaches the protocol layer.

use serde_json::Value;
use wasm_bindgen::JsValue;

use crate::error::to_js_error;

/// Convert a JS value to JSON. `undefined` and unserializable values map to
/// `None`.
pub(crate) fn to_json(value: &JsValue) -> Option<Value> {
    if value.is_undefined() {
        return None;
    }
    let text = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

pub(crate) fn to_js(value: &Value) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(|err| to_js_error("json encode failed", err))?;
    js_sys::JSON::parse(&text)
}

/// Read an optional string property.
pub(crate) fn string_field(object: &JsValue, key: &str) -> Option<String> {
    js_sys::Reflect::get(object, &JsValue::from_str(key))
        .ok()
        .and_then(|value| value.as_string())
}

/// Read an optional function property.
pub(crate) fn function_field(object: &JsValue, key: &str) -> Option<js_sys::Function> {
    use wasm_bindgen::JsCast;

    js_sys::Reflect::get(object, &JsValue::from_str(key))
        .ok()
        .and_then(|value| value.dyn_into::<js_sys::Function>().ok())
}

/// Read an optional property as JSON.
pub(crate) fn json_field(object: &JsValue, key: &str) -> Option<Value> {
    js_sys::Reflect::get(object, &JsValue::from_str(key))
        .ok()
        .and_then(|value| to_json(&value))
}
