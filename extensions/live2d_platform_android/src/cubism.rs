//! Cubism runtime adapter
//!
//! The Cubism SDK for Java does the model work. This module implements the
//! bridge's runtime traits by calling static methods on the Kotlin wrapper:
//!
//! ```kotlin
//! package com.live2d.flutter
//!
//! object CubismBridge {
//!     @JvmStatic fun startup(): Boolean
//!     @JvmStatic fun initialize(): Boolean
//!     @JvmStatic fun dispose()
//!
//!     @JvmStatic fun prepareSurface()
//!     @JvmStatic fun setViewport(width: Int, height: Int)
//!     @JvmStatic fun clear(r: Float, g: Float, b: Float, a: Float)
//!     @JvmStatic fun loadAssets(dir: String, file: String): Long   // -1 on failure
//!     @JvmStatic fun lastError(): String?
//!     @JvmStatic fun canvasWidth(model: Long): Float
//!     @JvmStatic fun canvasHeight(model: Long): Float
//!     @JvmStatic fun release(model: Long)
//!     @JvmStatic fun update(model: Long)
//!     @JvmStatic fun draw(model: Long, mvp: FloatArray): Boolean
//!     @JvmStatic fun startMotion(model: Long, group: String, index: Int, priority: Int): Boolean
//!     @JvmStatic fun setExpression(model: Long, name: String): Boolean
//!     @JvmStatic fun closeRenderer()
//! }
//! ```
//!
//! Model ids from Kotlin are kept behind [`ModelHandle`]s so a stale handle
//! can never reach the SDK.

use jni::objects::{GlobalRef, JString, JValue, JValueOwned};
use jni::{JNIEnv, JavaVM};
use live2d_core::{Mat4, ModelHandle, ModelRenderer, MotionPriority, RenderFramework, RendererError};
use slotmap::SlotMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Fully qualified name of the Kotlin wrapper
pub const CUBISM_BRIDGE_CLASS: &str = "com/live2d/flutter/CubismBridge";

/// Cached VM and wrapper class, shared by the framework and every renderer
#[derive(Clone)]
pub struct CubismBridge {
    vm: Arc<JavaVM>,
    class: GlobalRef,
}

impl CubismBridge {
    pub fn new(env: &mut JNIEnv) -> Result<Self, jni::errors::Error> {
        let vm = env.get_java_vm()?;
        let class = env.find_class(CUBISM_BRIDGE_CLASS)?;
        let class = env.new_global_ref(class)?;
        debug!("CubismBridge class resolved");
        Ok(Self {
            vm: Arc::new(vm),
            class,
        })
    }

    pub fn vm(&self) -> &Arc<JavaVM> {
        &self.vm
    }

    /// Attach the calling thread, run `f`, and clear any pending exception
    fn with_env<T>(
        &self,
        f: impl FnOnce(&mut JNIEnv) -> Result<T, jni::errors::Error>,
    ) -> Result<T, jni::errors::Error> {
        let mut env = self.vm.attach_current_thread()?;
        let result = f(&mut *env);
        if env.exception_check()? {
            env.exception_describe()?;
            env.exception_clear()?;
        }
        result
    }

    fn call_static<'local>(
        &self,
        env: &mut JNIEnv<'local>,
        name: &str,
        sig: &str,
        args: &[JValue],
    ) -> Result<JValueOwned<'local>, jni::errors::Error> {
        env.call_static_method(&self.class, name, sig, args)
    }

    fn call_void(&self, name: &str, sig: &str, args: &[JValue]) -> Result<(), jni::errors::Error> {
        self.with_env(|env| self.call_static(env, name, sig, args)?.v())
    }

    fn call_bool(&self, name: &str, sig: &str, args: &[JValue]) -> Result<bool, jni::errors::Error> {
        self.with_env(|env| self.call_static(env, name, sig, args)?.z())
    }

    fn call_float(&self, name: &str, sig: &str, args: &[JValue]) -> Result<f32, jni::errors::Error> {
        self.with_env(|env| self.call_static(env, name, sig, args)?.f())
    }

    /// Diagnostic text for the last failed SDK call
    fn last_error(&self) -> String {
        let message = self.with_env(|env| {
            let obj = self
                .call_static(env, "lastError", "()Ljava/lang/String;", &[])?
                .l()?;
            if obj.is_null() {
                return Ok(None);
            }
            let text: String = env.get_string(&JString::from(obj))?.into();
            Ok(Some(text))
        });
        match message {
            Ok(Some(text)) => text,
            Ok(None) => "unknown error".to_string(),
            Err(e) => format!("lastError failed: {}", e),
        }
    }
}

fn jni_err(e: jni::errors::Error) -> RendererError {
    RendererError::Framework(format!("JNI: {}", e))
}

/// Process-wide Cubism lifecycle
pub struct CubismFramework {
    bridge: CubismBridge,
}

impl CubismFramework {
    pub fn new(bridge: CubismBridge) -> Self {
        Self { bridge }
    }
}

impl RenderFramework for CubismFramework {
    fn startup(&self) -> Result<(), RendererError> {
        match self.bridge.call_bool("startup", "()Z", &[]).map_err(jni_err)? {
            true => Ok(()),
            false => Err(RendererError::Framework(self.bridge.last_error())),
        }
    }

    fn initialize(&self) -> Result<(), RendererError> {
        match self.bridge.call_bool("initialize", "()Z", &[]).map_err(jni_err)? {
            true => Ok(()),
            false => Err(RendererError::Framework(self.bridge.last_error())),
        }
    }

    fn dispose(&self) {
        if let Err(e) = self.bridge.call_void("dispose", "()V", &[]) {
            error!("CubismBridge.dispose failed: {}", e);
        }
    }
}

/// Per-view renderer, used only on that view's GL thread
pub struct CubismRenderer {
    bridge: CubismBridge,
    models: SlotMap<ModelHandle, i64>,
}

impl CubismRenderer {
    pub fn new(bridge: CubismBridge) -> Self {
        Self {
            bridge,
            models: SlotMap::with_key(),
        }
    }

    fn model_id(&self, model: ModelHandle) -> Result<i64, RendererError> {
        self.models
            .get(model)
            .copied()
            .ok_or(RendererError::UnknownModel)
    }

    fn release_id(&self, id: i64) {
        if let Err(e) = self.bridge.call_void("release", "(J)V", &[JValue::Long(id)]) {
            warn!("release({}) failed: {}", id, e);
        }
    }

    /// Call a `(J, String, ...) -> Boolean` trigger method
    fn trigger(
        &self,
        name: &str,
        sig: &str,
        model: i64,
        text: &str,
        extra: &[JValue],
    ) -> Result<bool, RendererError> {
        self.bridge
            .with_env(|env| {
                let text = env.new_string(text)?;
                let mut args = vec![JValue::Long(model), JValue::Object(&text)];
                args.extend_from_slice(extra);
                self.bridge.call_static(env, name, sig, &args)?.z()
            })
            .map_err(jni_err)
    }
}

impl ModelRenderer for CubismRenderer {
    fn prepare_surface(&mut self) {
        if let Err(e) = self.bridge.call_void("prepareSurface", "()V", &[]) {
            warn!("prepareSurface failed: {}", e);
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        let args = [JValue::Int(width as i32), JValue::Int(height as i32)];
        if let Err(e) = self.bridge.call_void("setViewport", "(II)V", &args) {
            warn!("setViewport failed: {}", e);
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        let args = color.map(JValue::Float);
        if let Err(e) = self.bridge.call_void("clear", "(FFFF)V", &args) {
            warn!("clear failed: {}", e);
        }
    }

    fn load_assets(&mut self, dir: &str, file: &str) -> Result<ModelHandle, RendererError> {
        let id = self
            .bridge
            .with_env(|env| {
                let dir = env.new_string(dir)?;
                let file = env.new_string(file)?;
                self.bridge
                    .call_static(
                        env,
                        "loadAssets",
                        "(Ljava/lang/String;Ljava/lang/String;)J",
                        &[JValue::Object(&dir), JValue::Object(&file)],
                    )?
                    .j()
            })
            .map_err(|e| RendererError::Load(e.to_string()))?;
        if id < 0 {
            return Err(RendererError::Load(self.bridge.last_error()));
        }
        Ok(self.models.insert(id))
    }

    fn canvas_size(&self, model: ModelHandle) -> Option<(f32, f32)> {
        let id = self.models.get(model).copied()?;
        let args = [JValue::Long(id)];
        let width = self.bridge.call_float("canvasWidth", "(J)F", &args).ok()?;
        let height = self.bridge.call_float("canvasHeight", "(J)F", &args).ok()?;
        Some((width, height))
    }

    fn release(&mut self, model: ModelHandle) {
        if let Some(id) = self.models.remove(model) {
            self.release_id(id);
        }
    }

    fn update(&mut self, model: ModelHandle) {
        if let Some(&id) = self.models.get(model) {
            if let Err(e) = self.bridge.call_void("update", "(J)V", &[JValue::Long(id)]) {
                warn!("update failed: {}", e);
            }
        }
    }

    fn draw(&mut self, model: ModelHandle, transform: &Mat4) -> Result<(), RendererError> {
        let id = self.model_id(model)?;
        let cols = transform.to_cols_array();
        let drawn = self
            .bridge
            .with_env(|env| {
                let mvp = env.new_float_array(16)?;
                env.set_float_array_region(&mvp, 0, &cols)?;
                self.bridge
                    .call_static(env, "draw", "(J[F)Z", &[JValue::Long(id), JValue::Object(&mvp)])?
                    .z()
            })
            .map_err(|e| RendererError::Draw(e.to_string()))?;
        if drawn {
            Ok(())
        } else {
            Err(RendererError::Draw(self.bridge.last_error()))
        }
    }

    fn start_motion(
        &mut self,
        model: ModelHandle,
        group: &str,
        index: u32,
        priority: MotionPriority,
    ) -> Result<(), RendererError> {
        let id = self.model_id(model)?;
        let extra = [JValue::Int(index as i32), JValue::Int(priority.level())];
        if self.trigger("startMotion", "(JLjava/lang/String;II)Z", id, group, &extra)? {
            Ok(())
        } else {
            Err(RendererError::Animation(self.bridge.last_error()))
        }
    }

    fn set_expression(&mut self, model: ModelHandle, id: &str) -> Result<(), RendererError> {
        let model_id = self.model_id(model)?;
        if self.trigger("setExpression", "(JLjava/lang/String;)Z", model_id, id, &[])? {
            Ok(())
        } else {
            Err(RendererError::Animation(self.bridge.last_error()))
        }
    }

    fn close(&mut self) {
        let ids: Vec<i64> = self.models.drain().map(|(_, id)| id).collect();
        for id in ids {
            self.release_id(id);
        }
        if let Err(e) = self.bridge.call_void("closeRenderer", "()V", &[]) {
            warn!("closeRenderer failed: {}", e);
        }
    }
}
