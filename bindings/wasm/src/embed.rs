use std::rc::Rc;

use embedlink_bridge::{
    BridgeConfig, BridgeHandlers, CallbackEvent, Delivery, FrameBridge, InitialParams,
    ProtocolVersion, UnsafeParams,
};
use serde_json::{json, Value};
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlIFrameElement;

use crate::convert::{function_field, json_field, string_field, to_js, to_json};
use crate::error::{invalid_argument, to_js_error};
use crate::frame::IframeHost;
use crate::window::WebWindow;

/// An embedded store iframe bound to the current page.
///
/// ```js
/// const embed = new StoreEmbed(iframe, {
///   targetUrl: "https://demo.integrations.store/",
///   token,
///   unsafeParams: { userId: "u-1" },
///   onPathChange: (path) => history.replaceState(null, "", path),
/// });
/// embed.navigate();
/// ```
#[wasm_bindgen]
pub struct StoreEmbed {
    bridge: FrameBridge,
}

#[wasm_bindgen]
impl StoreEmbed {
    /// Mount on `iframe`. `options.targetUrl` is required; `parentDomain` is
    /// taken from `window.location`.
    #[wasm_bindgen(constructor)]
    pub fn new(iframe: HtmlIFrameElement, options: JsValue) -> Result<StoreEmbed, JsValue> {
        let window = web_sys::window().ok_or_else(|| invalid_argument("no global window"))?;
        let parent_origin = window
            .location()
            .origin()
            .map_err(|err| to_js_error("cannot read window origin", format!("{err:?}")))?;

        let config = read_config(&options)?.with_parent_origin(parent_origin);
        let bridge = FrameBridge::mount(
            config,
            read_handlers(&options),
            Rc::new(WebWindow::new(window)),
            Rc::new(IframeHost::new(iframe)),
        )
        .map_err(|err| to_js_error("mount failed", err))?;

        Ok(StoreEmbed { bridge })
    }

    /// Mount on the iframe with id `id`.
    #[wasm_bindgen(js_name = mountById)]
    pub fn mount_by_id(id: &str, options: JsValue) -> Result<StoreEmbed, JsValue> {
        let iframe = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(id))
            .ok_or_else(|| invalid_argument(&format!("no element with id '{id}'")))?
            .dyn_into::<HtmlIFrameElement>()
            .map_err(|_| invalid_argument(&format!("element '{id}' is not an iframe")))?;
        Self::new(iframe, options)
    }

    /// Load the initial URL. Returns it the first time, `undefined` after.
    pub fn navigate(&self) -> Result<Option<String>, JsValue> {
        self.bridge
            .navigate()
            .map_err(|err| to_js_error("navigate failed", err))
    }

    /// Replace the unsafe params. Returns `"folded"`, `"posted"` or
    /// `"not-ready"`.
    #[wasm_bindgen(js_name = updateUnsafeParams)]
    pub fn update_unsafe_params(&self, params: JsValue) -> Result<String, JsValue> {
        let params = match to_json(&params) {
            Some(Value::Object(map)) => map,
            None | Some(Value::Null) => UnsafeParams::new(),
            Some(_) => return Err(invalid_argument("unsafe params must be an object")),
        };
        self.bridge
            .update_unsafe_params(params)
            .map(delivery_name)
            .map_err(|err| to_js_error("unsafe params update failed", err))
    }

    #[wasm_bindgen(js_name = reloadSession)]
    pub fn reload_session(&self) -> Result<String, JsValue> {
        self.bridge
            .reload_session()
            .map(delivery_name)
            .map_err(|err| to_js_error("session reload failed", err))
    }

    /// Stop listening. Returns false if already unmounted.
    pub fn unmount(&self) -> bool {
        self.bridge.unmount()
    }

    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        self.bridge.phase().as_str().to_string()
    }

    #[wasm_bindgen(getter, js_name = targetOrigin)]
    pub fn target_origin(&self) -> String {
        self.bridge.target_origin().as_str().to_string()
    }
}

/// Child side: read what the parent put in this iframe's URL.
#[wasm_bindgen(js_name = readInitialParams)]
pub fn read_initial_params(url: &str, protocol: Option<String>) -> Result<JsValue, JsValue> {
    let protocol = parse_protocol(protocol.as_deref())?;
    let params = InitialParams::from_url(url, protocol)
        .map_err(|err| to_js_error("cannot read initial params", err))?;
    to_js(&json!({
        "parentDomain": params.parent_origin,
        "token": params.token,
        "sessionId": params.session_id,
        "unsafeParams": params.unsafe_params,
    }))
}

fn read_config(options: &JsValue) -> Result<BridgeConfig, JsValue> {
    let target_url = string_field(options, "targetUrl")
        .ok_or_else(|| invalid_argument("options.targetUrl is required"))?;
    let protocol = parse_protocol(string_field(options, "protocol").as_deref())?;

    let mut config = BridgeConfig::new(target_url).with_protocol(protocol);
    if let Some(token) = string_field(options, "token") {
        config = config.with_token(token);
    }
    if let Some(session_id) = string_field(options, "sessionId") {
        config = config.with_session_id(session_id);
    }
    if let Some(page) = string_field(options, "page") {
        config = config.with_page(page);
    }
    if let Some(listing_id) = string_field(options, "listingId") {
        config = config.with_listing_id(listing_id);
    }
    match json_field(options, "unsafeParams") {
        Some(Value::Object(params)) => config = config.with_unsafe_params(params),
        None | Some(Value::Null) => {}
        Some(_) => return Err(invalid_argument("options.unsafeParams must be an object")),
    }
    Ok(config)
}

fn read_handlers(options: &JsValue) -> BridgeHandlers {
    let mut handlers = BridgeHandlers::new();

    if let Some(callback) = function_field(options, "onPathChange") {
        handlers = handlers.on_path_change(move |path: &str| {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(path)) {
                warn!(error = ?err, "onPathChange threw");
            }
        });
    }

    if let Some(callback) = function_field(options, "onCallback") {
        handlers = handlers.on_callback(move |event: &CallbackEvent| {
            let payload = to_js(&event.payload).unwrap_or(JsValue::UNDEFINED);
            match callback.call2(
                &JsValue::NULL,
                &JsValue::from_str(&event.action_identifier),
                &payload,
            ) {
                Ok(reply) => to_json(&reply),
                Err(err) => {
                    warn!(error = ?err, action = %event.action_identifier, "onCallback threw");
                    None
                }
            }
        });
    }

    if let Some(callback) = function_field(options, "onInstalledChange") {
        handlers = handlers.on_installed_change(move |listing_id: &str, installed: bool| {
            if let Err(err) = callback.call2(
                &JsValue::NULL,
                &JsValue::from_str(listing_id),
                &JsValue::from_bool(installed),
            ) {
                warn!(error = ?err, "onInstalledChange threw");
            }
        });
    }

    handlers
}

fn parse_protocol(input: Option<&str>) -> Result<ProtocolVersion, JsValue> {
    match input {
        Some(name) => name.parse().map_err(|err: String| invalid_argument(&err)),
        None => Ok(ProtocolVersion::default()),
    }
}

fn delivery_name(delivery: Delivery) -> String {
    match delivery {
        Delivery::FoldedIntoInitialUrl => "folded",
        Delivery::Posted => "posted",
        Delivery::TargetNotReady => "not-ready",
    }
    .to_string()
}
