use wasm_bindgen::JsValue;

pub(crate) fn to_js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&format!("{context}: {err}")).into()
}

pub(crate) fn invalid_argument(message: &str) -> JsValue {
    js_sys::TypeError::new(message).into()
}
