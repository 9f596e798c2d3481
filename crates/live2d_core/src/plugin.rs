//! Plugin channel and view registry
//!
//! The host exposes two kinds of method channel:
//!
//! - the plugin channel (`flutter_live2d`), which targets whichever view
//!   was created most recently
//! - one channel per view (`live2d_view_<id>`), which targets that view only
//!
//! Both end up in a [`CommandRouter`]; the registry only maps ids to routers.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::command::{methods, Command};
use crate::error::{BridgeError, Result};
use crate::router::{Ack, CommandRouter};
use crate::value::{MethodCall, MethodResult};
use crate::view::ViewId;

/// Name of the plugin-wide method channel
pub const PLUGIN_CHANNEL: &str = "flutter_live2d";

/// Name of the method channel bound to one view
pub fn view_channel_name(id: ViewId) -> String {
    format!("live2d_view_{}", id)
}

#[derive(Debug, Default)]
struct RegistryInner {
    views: HashMap<ViewId, CommandRouter>,
    current: Option<ViewId>,
}

/// Live views by id, plus the one the plugin channel targets
#[derive(Debug, Default)]
pub struct ViewRegistry {
    inner: RwLock<RegistryInner>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view and make it current
    pub fn register(&self, id: ViewId, router: CommandRouter) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.views.insert(id, router).is_some() {
            tracing::warn!("View {} registered twice, replacing", id);
        }
        inner.current = Some(id);
        tracing::debug!("Registered view {} ({} live)", id, inner.views.len());
    }

    /// Forget a view; returns whether it was registered
    ///
    /// Removing the current view leaves no current view.
    pub fn unregister(&self, id: ViewId) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let removed = inner.views.remove(&id).is_some();
        if inner.current == Some(id) {
            inner.current = None;
        }
        if removed {
            tracing::debug!("Unregistered view {}", id);
        }
        removed
    }

    pub fn get(&self, id: ViewId) -> Option<CommandRouter> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.views.get(&id).cloned()
    }

    /// Router of the current view
    pub fn current(&self) -> Option<CommandRouter> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.current.and_then(|id| inner.views.get(&id).cloned())
    }

    pub fn current_id(&self) -> Option<ViewId> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .views
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entry point for both method channels
#[derive(Debug, Default)]
pub struct Live2dPlugin {
    registry: ViewRegistry,
}

impl Live2dPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Handle a call on the plugin channel
    pub fn handle_method_call(&self, call: &MethodCall) -> MethodResult {
        let result = self.dispatch_current(call);
        log_result(&call.method, &result);
        result.into()
    }

    /// Handle a call on one view's own channel
    pub fn handle_view_call(&self, id: ViewId, call: &MethodCall) -> MethodResult {
        let result = Command::from_call(call).and_then(|command| {
            self.registry
                .get(id)
                .ok_or(BridgeError::NoActiveView)?
                .submit(command)
        });
        log_result(&call.method, &result);
        result.into()
    }

    fn dispatch_current(&self, call: &MethodCall) -> Result<Ack> {
        // The framework is brought up by the first view that starts
        if call.method == methods::INIT_LIVE2D {
            return Ok(Ack::IMMEDIATE);
        }
        let command = Command::from_call(call)?;
        self.registry
            .current()
            .ok_or(BridgeError::NoActiveView)?
            .submit(command)
    }
}

fn log_result(method: &str, result: &Result<Ack>) {
    match result {
        Ok(ack) => tracing::trace!("{} accepted (#{})", method, ack.sequence),
        Err(BridgeError::NotImplemented(_)) => {
            tracing::debug!("{} is not implemented", method)
        }
        Err(e) => tracing::warn!("{} failed: {}", method, e),
    }
}
