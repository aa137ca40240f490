//! Web worker entry points
//!
//! The page posts a JSON tick request to the worker; the worker answers with
//! the JSON response. No state lives here between calls.

use wasm_bindgen::prelude::*;

use crate::transport;

/// Install the panic hook and console logger. Safe to call more than once.
#[wasm_bindgen]
pub fn init_worker() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_ok() {
        log::info!("Squishdrop worker ready");
    }
}

/// Run one tick. Errors come back as a JS string so the host can fall back
/// to its in-process path.
#[wasm_bindgen]
pub fn step_json(request: &str) -> Result<String, JsValue> {
    transport::run_request_json(request).map_err(|e| {
        log::warn!("Worker tick failed: {}", e);
        JsValue::from_str(&e.to_string())
    })
}
