//! View lifecycle: `Uninitialized -> Started -> Disposed`

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::{BridgeError, Result};
use crate::framework::{FrameworkLease, FrameworkScope};
use crate::queue::CommandQueue;

/// Lifecycle phase of one view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    Uninitialized = 0,
    Started = 1,
    Disposed = 2,
}

impl Phase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Phase::Uninitialized,
            1 => Phase::Started,
            _ => Phase::Disposed,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Started => "started",
            Phase::Disposed => "disposed",
        })
    }
}

/// Phase readable from any thread
///
/// Routers read it to reject commands early; only the lifecycle manager
/// writes it.
#[derive(Debug)]
pub struct PhaseCell(AtomicU8);

impl Default for PhaseCell {
    fn default() -> Self {
        Self(AtomicU8::new(Phase::Uninitialized as u8))
    }
}

impl PhaseCell {
    pub fn get(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Acquire))
    }

    fn swap(&self, phase: Phase) -> Phase {
        Phase::from_u8(self.0.swap(phase as u8, Ordering::AcqRel))
    }

    /// Move `from -> to`; false if the phase was something else
    fn advance(&self, from: Phase, to: Phase) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Orders startup and teardown for one view
pub struct LifecycleManager {
    phase: Arc<PhaseCell>,
    queue: Arc<CommandQueue>,
    scope: Arc<FrameworkScope>,
    lease: Option<FrameworkLease>,
}

impl LifecycleManager {
    pub fn new(scope: Arc<FrameworkScope>, queue: Arc<CommandQueue>) -> Self {
        Self {
            phase: Arc::new(PhaseCell::default()),
            queue,
            scope,
            lease: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Shared phase cell for routers and the render loop
    pub fn phase_cell(&self) -> Arc<PhaseCell> {
        Arc::clone(&self.phase)
    }

    /// Start the framework (once per process scope) and open the view
    ///
    /// Idempotent while started. A disposed view cannot be restarted.
    pub fn start(&mut self) -> Result<()> {
        match self.phase.get() {
            Phase::Started => return Ok(()),
            Phase::Disposed => return Err(BridgeError::NotReady(Phase::Disposed)),
            Phase::Uninitialized => {}
        }
        let lease = self.scope.acquire()?;
        if !self.phase.advance(Phase::Uninitialized, Phase::Started) {
            lease.release();
            return Err(BridgeError::NotReady(self.phase.get()));
        }
        self.lease = Some(lease);
        tracing::info!("View started");
        Ok(())
    }

    /// Tear the view down
    ///
    /// Closes the queue (discarding what is still waiting), runs
    /// `release_resources` to free the model and renderer, then gives up the
    /// framework lease. Returns the number of discarded commands, or `None`
    /// if the view was already disposed. Valid from any phase.
    pub fn dispose<F>(&mut self, release_resources: F) -> Option<usize>
    where
        F: FnOnce(),
    {
        let previous = self.phase.swap(Phase::Disposed);
        if previous == Phase::Disposed {
            tracing::debug!("Dispose called on an already disposed view");
            return None;
        }
        let discarded = self.queue.close();
        release_resources();
        if let Some(lease) = self.lease.take() {
            lease.release();
        }
        tracing::info!("View disposed from phase {}", previous);
        Some(discarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::mock::MockFramework;

    fn manager() -> (LifecycleManager, Arc<MockFramework>, Arc<CommandQueue>) {
        let framework = Arc::new(MockFramework::default());
        let queue = Arc::new(CommandQueue::new(4));
        let manager = LifecycleManager::new(FrameworkScope::new(framework.clone()), queue.clone());
        (manager, framework, queue)
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut lifecycle, framework, _) = manager();
        assert_eq!(lifecycle.phase(), Phase::Uninitialized);
        lifecycle.start().unwrap();
        lifecycle.start().unwrap();
        assert_eq!(lifecycle.phase(), Phase::Started);
        assert_eq!(framework.startups(), 1);
    }

    #[test]
    fn test_dispose_twice_is_noop() {
        let (mut lifecycle, framework, queue) = manager();
        lifecycle.start().unwrap();
        queue.push(Command::SetScale { factor: 2.0 }).unwrap();

        let mut releases = 0;
        assert_eq!(lifecycle.dispose(|| releases += 1), Some(1));
        assert_eq!(lifecycle.dispose(|| releases += 1), None);
        assert_eq!(releases, 1);
        assert_eq!(framework.disposals(), 1);
        assert!(queue.is_closed());
    }

    #[test]
    fn test_dispose_before_start() {
        let (mut lifecycle, framework, _) = manager();
        assert_eq!(lifecycle.dispose(|| {}), Some(0));
        assert_eq!(lifecycle.phase(), Phase::Disposed);
        assert_eq!(framework.startups(), 0);
        assert_eq!(framework.disposals(), 0);
    }

    #[test]
    fn test_no_restart_after_dispose() {
        let (mut lifecycle, framework, _) = manager();
        lifecycle.start().unwrap();
        lifecycle.dispose(|| {});
        assert_eq!(
            lifecycle.start(),
            Err(BridgeError::NotReady(Phase::Disposed))
        );
        assert_eq!(framework.startups(), 1);
    }

    #[test]
    fn test_failed_start_stays_uninitialized() {
        let framework = Arc::new(MockFramework::failing("boom"));
        let mut lifecycle = LifecycleManager::new(
            FrameworkScope::new(framework),
            Arc::new(CommandQueue::new(1)),
        );
        assert!(matches!(lifecycle.start(), Err(BridgeError::FrameworkInit(_))));
        assert_eq!(lifecycle.phase(), Phase::Uninitialized);
        // Teardown after a failed start is still clean
        assert_eq!(lifecycle.dispose(|| {}), Some(0));
    }
}
