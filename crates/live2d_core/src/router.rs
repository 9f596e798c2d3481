//! Control-plane command admission
//!
//! The router runs on whatever thread delivers host calls. It validates,
//! checks the view is started and hands the command to the queue. It never
//! waits for the render thread: an [`Ack`] means "accepted", not "applied".

use std::sync::Arc;

use live2d_platform::{TouchAction, TouchEvent};

use crate::command::Command;
use crate::error::{BridgeError, Result};
use crate::lifecycle::{Phase, PhaseCell};
use crate::queue::CommandQueue;
use crate::value::{MethodArgs, MethodCall};

/// Acknowledgment of an accepted command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ack {
    /// Admission order; compare with `ViewState::last_applied` to learn
    /// whether the command has been applied. Zero for calls that queue
    /// nothing.
    pub sequence: u64,
}

impl Ack {
    /// Ack for calls that succeed without queuing anything
    pub const IMMEDIATE: Ack = Ack { sequence: 0 };
}

/// Cloneable entry point into one view's command queue
#[derive(Clone, Debug)]
pub struct CommandRouter {
    queue: Arc<CommandQueue>,
    phase: Arc<PhaseCell>,
}

impl CommandRouter {
    pub fn new(queue: Arc<CommandQueue>, phase: Arc<PhaseCell>) -> Self {
        Self { queue, phase }
    }

    /// Validate and enqueue a host call
    pub fn handle(&self, call: &MethodCall) -> Result<Ack> {
        let command = Command::from_call(call)?;
        self.submit(command)
    }

    /// Convenience form of [`CommandRouter::handle`]
    pub fn handle_named(&self, method: &str, args: MethodArgs) -> Result<Ack> {
        self.handle(&MethodCall::new(method, args))
    }

    /// Enqueue an already validated command
    pub fn submit(&self, command: Command) -> Result<Ack> {
        let phase = self.phase.get();
        if phase != Phase::Started {
            tracing::debug!("Rejecting {} while {}", command.name(), phase);
            return Err(BridgeError::NotReady(phase));
        }
        let name = command.name();
        match self.queue.push(command) {
            Ok(ack) => {
                tracing::trace!("Queued {} as #{}", name, ack.sequence);
                Ok(ack)
            }
            Err(e) => {
                tracing::warn!("Rejected {}: {}", name, e);
                Err(e)
            }
        }
    }

    /// Route a raw touch event from the input thread
    ///
    /// Returns whether the event was consumed. Down is consumed so the
    /// gesture stays with the view; moves become drag commands.
    pub fn on_touch(&self, event: TouchEvent) -> Result<bool> {
        match event.action {
            TouchAction::Down => Ok(true),
            TouchAction::Move => {
                self.submit(Command::Drag {
                    x: event.x,
                    y: event.y,
                })?;
                Ok(true)
            }
            TouchAction::Up | TouchAction::Cancel => Ok(false),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Commands waiting for the render loop
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::FrameworkScope;
    use crate::lifecycle::LifecycleManager;
    use crate::mock::MockFramework;

    fn started_router(capacity: usize) -> (CommandRouter, LifecycleManager) {
        let queue = Arc::new(CommandQueue::new(capacity));
        let mut lifecycle = LifecycleManager::new(
            FrameworkScope::new(Arc::new(MockFramework::default())),
            queue.clone(),
        );
        lifecycle.start().unwrap();
        (CommandRouter::new(queue, lifecycle.phase_cell()), lifecycle)
    }

    #[test]
    fn test_not_ready_before_start() {
        let queue = Arc::new(CommandQueue::new(4));
        let lifecycle = LifecycleManager::new(
            FrameworkScope::new(Arc::new(MockFramework::default())),
            queue.clone(),
        );
        let router = CommandRouter::new(queue.clone(), lifecycle.phase_cell());
        assert_eq!(
            router.handle_named("setScale", MethodArgs::new().with("scale", 2.0)),
            Err(BridgeError::NotReady(Phase::Uninitialized))
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_validation_precedes_readiness() {
        let queue = Arc::new(CommandQueue::new(4));
        let lifecycle = LifecycleManager::new(
            FrameworkScope::new(Arc::new(MockFramework::default())),
            queue.clone(),
        );
        let router = CommandRouter::new(queue, lifecycle.phase_cell());
        assert!(matches!(
            router.handle_named("setScale", MethodArgs::new()),
            Err(BridgeError::InvalidArgument { field: "scale", .. })
        ));
        assert!(matches!(
            router.handle_named("nope", MethodArgs::new()),
            Err(BridgeError::NotImplemented(_))
        ));
    }

    #[test]
    fn test_ack_sequences_increase() {
        let (router, _lifecycle) = started_router(4);
        let a = router
            .handle_named("setPosition", MethodArgs::new().with("x", 1.0).with("y", 1.0))
            .unwrap();
        let b = router
            .handle_named("setExpression", MethodArgs::new().with("expression", "f01"))
            .unwrap();
        assert!(b.sequence > a.sequence);
        assert_eq!(router.pending(), 2);
    }

    #[test]
    fn test_queue_full_reported() {
        let (router, _lifecycle) = started_router(2);
        for _ in 0..2 {
            router
                .handle_named("setScale", MethodArgs::new().with("scale", 1.0))
                .unwrap();
        }
        assert_eq!(
            router.handle_named("setScale", MethodArgs::new().with("scale", 1.0)),
            Err(BridgeError::QueueFull { capacity: 2 })
        );
        assert_eq!(router.pending(), 2);
    }

    #[test]
    fn test_rejects_after_dispose() {
        let (router, mut lifecycle) = started_router(4);
        lifecycle.dispose(|| {});
        assert_eq!(
            router.handle_named("setScale", MethodArgs::new().with("scale", 1.0)),
            Err(BridgeError::NotReady(Phase::Disposed))
        );
    }

    #[test]
    fn test_touch_routing() {
        let (router, _lifecycle) = started_router(4);
        assert!(router.on_touch(TouchEvent::new(TouchAction::Down, 1.0, 1.0)).unwrap());
        assert_eq!(router.pending(), 0);
        assert!(router.on_touch(TouchEvent::new(TouchAction::Move, 5.0, 6.0)).unwrap());
        assert_eq!(router.pending(), 1);
        assert!(!router.on_touch(TouchEvent::new(TouchAction::Up, 5.0, 6.0)).unwrap());
    }
}
