//! Kotlin JNI bridge for the Live2D platform view
//!
//! One `GLSurfaceView` per embedded view. Its renderer callbacks run on the GL
//! thread and own the view through an opaque handle; method channels and
//! touch input run on other threads and reach the view by id through the
//! plugin registry.
//!
//! # Usage from Kotlin
//!
//! ```kotlin
//! package com.live2d.flutter
//!
//! object Live2DNative {
//!     init {
//!         System.loadLibrary("live2d_platform_android")
//!     }
//!
//!     external fun nativeConfigure(toml: String): Boolean
//!     external fun nativeCreate(viewId: Long): Long
//!     external fun nativeSurfaceCreated(handle: Long)
//!     external fun nativeSurfaceChanged(handle: Long, width: Int, height: Int)
//!     external fun nativeDrawFrame(handle: Long)
//!     external fun nativeDestroy(handle: Long)
//!     external fun nativeOnTouch(viewId: Long, action: Int, x: Float, y: Float): Boolean
//!     external fun nativeHandleMethodCall(method: String, argsJson: String): String
//!     external fun nativeViewMethodCall(viewId: Long, method: String, argsJson: String): String
//!
//!     @JvmStatic
//!     fun onViewEvent(viewId: Long, eventJson: String) {
//!         // forward to the view's event channel
//!     }
//! }
//! ```
//!
//! `nativeDestroy` must run on the GL thread (`GLSurfaceView.queueEvent`),
//! like the surface callbacks, so the handle is never used concurrently.

use jni::objects::{GlobalRef, JClass, JString, JValue};
use jni::sys::{jboolean, jfloat, jint, jlong, jstring, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;
use std::sync::Arc;

use live2d_core::{EventSink, FrameworkScope, Live2DView, ViewEvent};
use live2d_platform::{SurfaceEvent, SurfaceHandler, SurfaceSize};
use tracing::{debug, error, info, warn};

use crate::channel;
use crate::cubism::{CubismBridge, CubismFramework, CubismRenderer};

type AndroidView = Live2DView<CubismRenderer>;

/// Initialize the bridge configuration from TOML text
///
/// # JNI Signature
/// `(Ljava/lang/String;)Z`
#[no_mangle]
pub extern "system" fn Java_com_live2d_flutter_Live2DNative_nativeConfigure(
    mut env: JNIEnv,
    _class: JClass,
    toml: JString,
) -> jboolean {
    crate::init_logging();
    let Some(toml) = read_string(&mut env, &toml) else {
        return JNI_FALSE;
    };
    match channel::configure(&toml) {
        Ok(()) => JNI_TRUE,
        Err(e) => {
            error!("Rejected configuration: {}", e);
            JNI_FALSE
        }
    }
}

/// Create and start a view
///
/// # Returns
/// * Opaque handle (Long) to the view, or 0 on failure
///
/// # JNI Signature
/// `(J)J`
#[no_mangle]
pub extern "system" fn Java_com_live2d_flutter_Live2DNative_nativeCreate(
    mut env: JNIEnv,
    class: JClass,
    view_id: jlong,
) -> jlong {
    crate::init_logging();
    info!("Live2DNative.nativeCreate({})", view_id);

    let bridge = match CubismBridge::new(&mut env) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("Failed to resolve the Cubism bridge: {}", e);
            return 0;
        }
    };
    let events = match event_sink(&mut env, &class, view_id) {
        Ok(events) => events,
        Err(e) => {
            warn!("View events will only be logged: {}", e);
            EventSink::new()
        }
    };

    let scope = FrameworkScope::init_global(Arc::new(CubismFramework::new(bridge.clone())));
    let mut view = AndroidView::new(
        view_id,
        &channel::config(),
        scope,
        CubismRenderer::new(bridge),
        events,
    );
    if let Err(e) = view.start() {
        error!("View {} failed to start: {}", view_id, e);
        view.dispose();
        return 0;
    }
    channel::plugin().registry().register(view_id, view.router());

    let ptr = Box::into_raw(Box::new(view));
    debug!("Created view handle at {:p}", ptr);
    ptr as jlong
}

/// `GLSurfaceView.Renderer.onSurfaceCreated`
///
/// # JNI Signature
/// `(J)V`
#[no_mangle]
pub extern "system" fn Java_com_live2d_flutter_Live2DNative_nativeSurfaceCreated(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    if let Some(view) = view_mut(handle, "nativeSurfaceCreated") {
        view.handle_event(SurfaceEvent::Created);
    }
}

/// `GLSurfaceView.Renderer.onSurfaceChanged`
///
/// # JNI Signature
/// `(JII)V`
#[no_mangle]
pub extern "system" fn Java_com_live2d_flutter_Live2DNative_nativeSurfaceChanged(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    width: jint,
    height: jint,
) {
    let Some(view) = view_mut(handle, "nativeSurfaceChanged") else {
        return;
    };
    match SurfaceSize::from_host(width, height) {
        Ok(size) => {
            view.handle_event(SurfaceEvent::Changed(size));
        }
        Err(e) => warn!("Ignoring surface change: {}", e),
    }
}

/// `GLSurfaceView.Renderer.onDrawFrame`
///
/// # JNI Signature
/// `(J)V`
#[no_mangle]
pub extern "system" fn Java_com_live2d_flutter_Live2DNative_nativeDrawFrame(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    if let Some(view) = view_mut(handle, "nativeDrawFrame") {
        view.on_draw_frame();
    }
}

/// Dispose the view and free the handle
///
/// # JNI Signature
/// `(J)V`
#[no_mangle]
pub extern "system" fn Java_com_live2d_flutter_Live2DNative_nativeDestroy(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    if handle == 0 {
        warn!("nativeDestroy called with null handle");
        return;
    }

    info!("Destroying view handle at {:p}", handle as *const ());

    // Reclaim the Box; dropping it after dispose frees the view
    let mut view = unsafe { Box::from_raw(handle as *mut AndroidView) };
    channel::plugin().registry().unregister(view.id());
    view.handle_event(SurfaceEvent::Destroyed);
    view.dispose();
}

/// Handle touch input from the UI thread
///
/// # JNI Signature
/// `(JIFF)Z`
#[no_mangle]
pub extern "system" fn Java_com_live2d_flutter_Live2DNative_nativeOnTouch(
    _env: JNIEnv,
    _class: JClass,
    view_id: jlong,
    action: jint,
    x: jfloat,
    y: jfloat,
) -> jboolean {
    if channel::touch(channel::plugin(), view_id, action, x, y) {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

/// Plugin channel (`flutter_live2d`) entry point
///
/// # JNI Signature
/// `(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;`
#[no_mangle]
pub extern "system" fn Java_com_live2d_flutter_Live2DNative_nativeHandleMethodCall(
    mut env: JNIEnv,
    _class: JClass,
    method: JString,
    args_json: JString,
) -> jstring {
    let method = read_string(&mut env, &method).unwrap_or_default();
    let args = read_string(&mut env, &args_json).unwrap_or_default();
    let result = channel::plugin_call(channel::plugin(), &method, &args);
    to_jstring(&mut env, &result)
}

/// Per-view channel (`live2d_view_<id>`) entry point
///
/// # JNI Signature
/// `(JLjava/lang/String;Ljava/lang/String;)Ljava/lang/String;`
#[no_mangle]
pub extern "system" fn Java_com_live2d_flutter_Live2DNative_nativeViewMethodCall(
    mut env: JNIEnv,
    _class: JClass,
    view_id: jlong,
    method: JString,
    args_json: JString,
) -> jstring {
    let method = read_string(&mut env, &method).unwrap_or_default();
    let args = read_string(&mut env, &args_json).unwrap_or_default();
    let result = channel::view_call(channel::plugin(), view_id, &method, &args);
    to_jstring(&mut env, &result)
}

// ============================================================================
// Helper functions
// ============================================================================

fn view_mut<'a>(handle: jlong, caller: &str) -> Option<&'a mut AndroidView> {
    if handle == 0 {
        warn!("{} called with null handle", caller);
        return None;
    }
    Some(unsafe { &mut *(handle as *mut AndroidView) })
}

fn read_string(env: &mut JNIEnv, value: &JString) -> Option<String> {
    if value.is_null() {
        return None;
    }
    match env.get_string(value) {
        Ok(s) => Some(s.into()),
        Err(e) => {
            warn!("Failed to read Java string: {}", e);
            None
        }
    }
}

fn to_jstring(env: &mut JNIEnv, value: &str) -> jstring {
    match env.new_string(value) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("Failed to create Java string: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Post view events to `Live2DNative.onViewEvent(viewId, json)`
fn event_sink(
    env: &mut JNIEnv,
    class: &JClass,
    view_id: jlong,
) -> Result<EventSink, jni::errors::Error> {
    let vm = env.get_java_vm()?;
    let class: GlobalRef = env.new_global_ref(class)?;
    Ok(EventSink::with_listener(move |event: &ViewEvent| {
        let mut env = match vm.attach_current_thread() {
            Ok(env) => env,
            Err(e) => {
                warn!("Dropping view event, JNI attach failed: {}", e);
                return;
            }
        };
        let result = env.new_string(event.to_json()).and_then(|json| {
            env.call_static_method(
                &class,
                "onViewEvent",
                "(JLjava/lang/String;)V",
                &[JValue::Long(view_id), JValue::Object(&json)],
            )
        });
        if let Err(e) = result {
            warn!("onViewEvent failed: {}", e);
            let _ = env.exception_clear();
        }
    }))
}
