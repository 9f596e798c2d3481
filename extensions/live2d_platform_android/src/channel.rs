//! String-level method channel dispatch
//!
//! The JNI layer hands over method names and JSON-encoded argument maps and
//! expects a JSON result string back. Everything between those strings and
//! the [`Live2dPlugin`] lives here so it can be exercised off-device.

use live2d_core::{
    Ack, BridgeConfig, BridgeError, Live2dPlugin, MethodCall, MethodResult, ViewId,
};
use live2d_platform::TouchEvent;
use std::sync::{OnceLock, PoisonError, RwLock};

static PLUGIN: OnceLock<Live2dPlugin> = OnceLock::new();
static CONFIG: OnceLock<RwLock<BridgeConfig>> = OnceLock::new();

/// The process-wide plugin
pub fn plugin() -> &'static Live2dPlugin {
    PLUGIN.get_or_init(Live2dPlugin::new)
}

fn config_cell() -> &'static RwLock<BridgeConfig> {
    CONFIG.get_or_init(|| RwLock::new(BridgeConfig::default()))
}

/// Configuration applied to views created from now on
pub fn config() -> BridgeConfig {
    config_cell()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the configuration from TOML text
///
/// Views that already exist keep the configuration they were created with.
pub fn configure(toml: &str) -> Result<(), BridgeError> {
    let config = BridgeConfig::from_toml_str(toml)?;
    *config_cell()
        .write()
        .unwrap_or_else(PoisonError::into_inner) = config;
    tracing::info!("Bridge configuration updated");
    Ok(())
}

fn decode(method: &str, args_json: &str) -> Result<MethodCall, MethodResult> {
    MethodCall::from_json(method, args_json).map_err(|e| MethodResult::from(Err::<Ack, _>(e)))
}

/// Handle a call on the plugin channel and encode the result
pub fn plugin_call(plugin: &Live2dPlugin, method: &str, args_json: &str) -> String {
    let result = match decode(method, args_json) {
        Ok(call) => plugin.handle_method_call(&call),
        Err(result) => result,
    };
    result.to_json()
}

/// Handle a call on one view's channel and encode the result
pub fn view_call(plugin: &Live2dPlugin, view_id: ViewId, method: &str, args_json: &str) -> String {
    let result = match decode(method, args_json) {
        Ok(call) => plugin.handle_view_call(view_id, &call),
        Err(result) => result,
    };
    result.to_json()
}

/// Route a raw Android touch callback; returns whether it was consumed
pub fn touch(plugin: &Live2dPlugin, view_id: ViewId, action: i32, x: f32, y: f32) -> bool {
    let event = match TouchEvent::from_android(action, x, y) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!("Ignoring touch: {}", e);
            return false;
        }
    };
    let Some(router) = plugin.registry().get(view_id) else {
        tracing::debug!("Touch for unknown view {}", view_id);
        return false;
    };
    match router.on_touch(event) {
        Ok(consumed) => consumed,
        Err(e) => {
            tracing::warn!("Touch dropped for view {}: {}", view_id, e);
            false
        }
    }
}
