//! Live2D Bridge Core
//!
//! Routes control-plane method calls into a Live2D view whose drawable state
//! belongs to a single render thread:
//!
//! - **Command routing**: validated host calls become [`Command`]s on a bounded
//!   per-view queue ([`CommandRouter`])
//! - **Render loop**: each frame drains the queue, applies commands to the
//!   [`ViewState`] and draws the model ([`RenderLoop`])
//! - **Lifecycle**: views start, run and dispose exactly once, sharing one
//!   process-wide framework scope ([`LifecycleManager`], [`FrameworkScope`])
//! - **Plugin channels**: the plugin-wide and per-view method channels
//!   ([`Live2dPlugin`], [`ViewRegistry`])
//!
//! # Example
//!
//! ```ignore
//! use live2d_core::prelude::*;
//!
//! let scope = FrameworkScope::new(framework);
//! let mut view = Live2DView::new(1, &BridgeConfig::default(), scope, renderer, EventSink::new());
//! view.start()?;
//!
//! let plugin = Live2dPlugin::new();
//! plugin.registry().register(view.id(), view.router());
//!
//! let call = MethodCall::new("setScale", MethodArgs::new().with("scale", 2.0));
//! assert!(plugin.handle_method_call(&call).is_success());
//!
//! view.on_surface_changed(SurfaceSize::new(1080, 1920));
//! view.on_draw_frame(); // scale is 2.0 for this draw
//! ```

pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod framework;
pub mod lifecycle;
pub mod plugin;
pub mod queue;
pub mod render_loop;
pub mod renderer;
pub mod router;
pub mod state;
pub mod transform;
pub mod value;
pub mod view;

#[cfg(test)]
mod mock;

pub use command::{methods, Command, ModelPath, MotionPriority};
pub use config::BridgeConfig;
pub use driver::FrameDriver;
pub use error::{BridgeError, Result};
pub use events::{EventListener, EventSink, ViewEvent};
pub use framework::{FrameworkLease, FrameworkScope};
pub use lifecycle::{LifecycleManager, Phase, PhaseCell};
pub use plugin::{view_channel_name, Live2dPlugin, ViewRegistry, PLUGIN_CHANNEL};
pub use queue::{CommandQueue, Envelope};
pub use render_loop::{RenderLoop, TickStats};
pub use renderer::{ModelHandle, ModelRenderer, RenderFramework, RendererError};
pub use router::{Ack, CommandRouter};
pub use state::{LoadedModel, MotionRequest, ViewState, ViewSummary};
pub use transform::{aspect_correction, view_matrix, Mat4};
pub use value::{ArgValue, MethodArgs, MethodCall, MethodResult};
pub use view::{Live2DView, ViewId};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Ack, BridgeConfig, BridgeError, CommandRouter, EventSink, FrameDriver, FrameworkScope,
        Live2DView, Live2dPlugin, MethodArgs, MethodCall, MethodResult, ModelHandle,
        ModelRenderer, Phase, RenderFramework, RendererError, ViewEvent,
    };
    pub use live2d_platform::{
        ControlFlow, SurfaceConfig, SurfaceEvent, SurfaceHandler, SurfaceSize, TouchAction,
        TouchEvent,
    };
}
