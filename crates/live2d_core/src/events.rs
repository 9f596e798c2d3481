//! View event side-channel
//!
//! Failures that happen after a command was accepted (a model that does not
//! load, a draw call that faults) cannot be returned to the caller that
//! issued the command. They are logged and delivered here instead, so the
//! host can forward them over its event channel.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::BridgeError;

/// Something the host may want to know about a view
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ViewEvent {
    /// A model finished loading
    #[serde(rename_all = "camelCase")]
    ModelLoaded { sequence: u64, path: String },
    /// A model failed to load; the view has no model now
    #[serde(rename_all = "camelCase")]
    LoadFailed {
        sequence: u64,
        path: String,
        message: String,
    },
    /// A frame failed to draw; the loop carries on with the next frame
    RenderFault { message: String },
    /// The runtime refused a motion or expression trigger
    AnimationRejected { request: String, message: String },
    /// The view was torn down
    #[serde(rename_all = "camelCase")]
    Disposed { discarded_commands: usize },
}

impl ViewEvent {
    /// The bridge error this event reports, if it reports one
    pub fn error(&self) -> Option<BridgeError> {
        match self {
            ViewEvent::LoadFailed { path, message, .. } => Some(BridgeError::LoadFailure {
                path: path.clone(),
                message: message.clone(),
            }),
            ViewEvent::RenderFault { message } => Some(BridgeError::RenderFault(message.clone())),
            _ => None,
        }
    }

    /// Encode for the host's event channel
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"event":"encodeError","message":"{}"}}"#, e)
        })
    }
}

/// Callback invoked for every view event, from the render thread
pub type EventListener = Arc<dyn Fn(&ViewEvent) + Send + Sync>;

/// Logs every event and forwards it to an optional listener
#[derive(Clone, Default)]
pub struct EventSink {
    listener: Option<EventListener>,
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener<F>(listener: F) -> Self
    where
        F: Fn(&ViewEvent) + Send + Sync + 'static,
    {
        Self {
            listener: Some(Arc::new(listener)),
        }
    }

    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: Fn(&ViewEvent) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
    }

    pub fn emit(&self, event: ViewEvent) {
        match &event {
            ViewEvent::ModelLoaded { path, .. } => tracing::info!("Model loaded: {}", path),
            ViewEvent::LoadFailed { path, message, .. } => {
                tracing::error!("Model load failed for {}: {}", path, message)
            }
            ViewEvent::RenderFault { message } => tracing::warn!("Render fault: {}", message),
            ViewEvent::AnimationRejected { request, message } => {
                tracing::warn!("Runtime rejected {}: {}", request, message)
            }
            ViewEvent::Disposed { discarded_commands } => {
                tracing::info!("View disposed ({} pending commands discarded)", discarded_commands)
            }
        }
        if let Some(listener) = &self.listener {
            listener(&event);
        }
    }
}
