//! The JavaScript boundary: reaching the wallet objects the extensions
//! inject on `window`, calling into them whether they answer synchronously
//! or with a promise, and turning their rejections into typed failures.

pub mod injected;
pub mod popup;

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::error::{VendorError, VendorFailure};

/// Walk a dotted path (`"martian"`, `"nightly.aptos"`) from the global
/// window object down to the wallet's provider object.
pub(crate) fn lookup_global(path: &str) -> Option<JsValue> {
    let window = web_sys::window()?;
    let mut current: JsValue = window.into();
    for segment in path.split('.') {
        current = js_sys::Reflect::get(&current, &JsValue::from_str(segment)).ok()?;
        if current.is_undefined() || current.is_null() {
            return None;
        }
    }
    current.is_object().then_some(current)
}

/// Call `method` on the wallet's provider object. Wallets disagree on
/// whether some of these entry points return a promise or a plain value, so
/// a returned promise is awaited and anything else passes through as-is.
pub(crate) async fn call_method(
    target: &JsValue,
    method: &str,
    args: &[JsValue],
) -> Result<JsValue, VendorFailure> {
    let function = js_sys::Reflect::get(target, &JsValue::from_str(method))
        .ok()
        .filter(|value| value.is_function())
        .ok_or_else(|| VendorFailure::other(format!("wallet has no `{method}' entry point")))?;
    let function: js_sys::Function = function.unchecked_into();

    let result = function
        .apply(target, &js_sys::Array::from_iter(args.iter()))
        .map_err(decode_js_error)?;

    if result.has_type::<js_sys::Promise>() {
        JsFuture::from(js_sys::Promise::from(result))
            .await
            .map_err(decode_js_error)
    } else {
        Ok(result)
    }
}

/// Decode a JS-side rejection into the typed error object when it carries
/// one, and fall back to whatever message text is there otherwise.
pub(crate) fn decode_js_error(error: JsValue) -> VendorFailure {
    match serde_wasm_bindgen::from_value::<VendorError>(error.clone()) {
        Ok(decoded) => VendorFailure::Api(decoded),
        Err(_) => VendorFailure::Other(
            error
                .as_string()
                .or_else(|| {
                    js_sys::Reflect::get(&error, &JsValue::from_str("message"))
                        .ok()
                        .and_then(|message| message.as_string())
                })
                .unwrap_or_else(|| format!("{error:?}")),
        ),
    }
}

/// Decode a vendor response into plain JSON for the shape-tolerant decoders
/// in [`crate::vendor`].
pub(crate) fn decode_json(value: JsValue) -> Result<serde_json::Value, VendorFailure> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|error| VendorFailure::other(format!("couldn't decode the response: {error}")))
}
