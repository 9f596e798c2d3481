//! Process-wide ownership of the rendering framework
//!
//! The runtime must be started exactly once before any view loads a model
//! and disposed exactly once after the last view is gone, no matter how
//! many views come and go. Views hold a [`FrameworkLease`]; the first lease
//! starts the framework and dropping the last one disposes it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::error::{BridgeError, Result};
use crate::renderer::RenderFramework;

/// Process-wide scope, for hosts with one framework per process
static GLOBAL_SCOPE: OnceLock<Arc<FrameworkScope>> = OnceLock::new();

/// Reference-counted owner of a [`RenderFramework`]
pub struct FrameworkScope {
    framework: Arc<dyn RenderFramework>,
    leases: Mutex<usize>,
}

impl fmt::Debug for FrameworkScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameworkScope")
            .field("leases", &self.active_leases())
            .finish()
    }
}

impl FrameworkScope {
    pub fn new(framework: Arc<dyn RenderFramework>) -> Arc<Self> {
        Arc::new(Self {
            framework,
            leases: Mutex::new(0),
        })
    }

    /// Install the process-wide scope
    ///
    /// The first call wins; later calls get the scope that is already
    /// installed and their framework is ignored.
    pub fn init_global(framework: Arc<dyn RenderFramework>) -> Arc<Self> {
        let mut installed = false;
        let scope = GLOBAL_SCOPE.get_or_init(|| {
            installed = true;
            Self::new(framework)
        });
        if !installed {
            tracing::debug!("FrameworkScope already initialized");
        }
        Arc::clone(scope)
    }

    /// The process-wide scope, if installed
    pub fn global() -> Option<Arc<Self>> {
        GLOBAL_SCOPE.get().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.leases.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live leases
    pub fn active_leases(&self) -> usize {
        *self.lock()
    }

    /// Take a lease, starting the framework if this is the first one
    ///
    /// The lock is held across startup so concurrent first acquisitions
    /// cannot both start the framework. A failed startup leaves the count
    /// untouched, so the next acquisition retries. If initialization fails
    /// after startup, the framework is disposed before the error returns.
    pub fn acquire(self: &Arc<Self>) -> Result<FrameworkLease> {
        let mut leases = self.lock();
        if *leases == 0 {
            tracing::info!("Starting rendering framework");
            self.framework
                .startup()
                .map_err(|e| BridgeError::FrameworkInit(e.to_string()))?;
            if let Err(e) = self.framework.initialize() {
                tracing::warn!("Framework initialization failed, disposing: {}", e);
                self.framework.dispose();
                return Err(BridgeError::FrameworkInit(e.to_string()));
            }
        }
        *leases += 1;
        tracing::debug!("Framework lease acquired ({} active)", *leases);
        Ok(FrameworkLease {
            scope: Some(Arc::clone(self)),
        })
    }

    fn release(&self) {
        let mut leases = self.lock();
        match *leases {
            0 => tracing::warn!("Framework lease released with no active leases"),
            1 => {
                *leases = 0;
                tracing::info!("Disposing rendering framework");
                self.framework.dispose();
            }
            n => {
                *leases = n - 1;
                tracing::debug!("Framework lease released ({} active)", n - 1);
            }
        }
    }
}

/// One view's claim on the running framework
///
/// Released explicitly with [`FrameworkLease::release`] or on drop, once.
#[derive(Debug)]
pub struct FrameworkLease {
    scope: Option<Arc<FrameworkScope>>,
}

impl FrameworkLease {
    pub fn release(mut self) {
        if let Some(scope) = self.scope.take() {
            scope.release();
        }
    }
}

impl Drop for FrameworkLease {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.take() {
            scope.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFramework;

    #[test]
    fn test_first_lease_starts_last_lease_disposes() {
        let framework = Arc::new(MockFramework::default());
        let scope = FrameworkScope::new(framework.clone());

        let a = scope.acquire().unwrap();
        let b = scope.acquire().unwrap();
        assert_eq!(framework.startups(), 1);
        assert_eq!(framework.initializations(), 1);
        assert_eq!(scope.active_leases(), 2);

        a.release();
        assert_eq!(framework.disposals(), 0);
        drop(b);
        assert_eq!(framework.disposals(), 1);
        assert_eq!(scope.active_leases(), 0);
    }

    #[test]
    fn test_restart_after_full_release() {
        let framework = Arc::new(MockFramework::default());
        let scope = FrameworkScope::new(framework.clone());

        scope.acquire().unwrap().release();
        scope.acquire().unwrap().release();
        assert_eq!(framework.startups(), 2);
        assert_eq!(framework.disposals(), 2);
    }

    #[test]
    fn test_failed_startup_takes_no_lease() {
        let framework = Arc::new(MockFramework::failing("no GL context"));
        let scope = FrameworkScope::new(framework.clone());

        match scope.acquire() {
            Err(BridgeError::FrameworkInit(msg)) => assert!(msg.contains("no GL context")),
            other => panic!("expected FrameworkInit, got {:?}", other),
        }
        assert_eq!(scope.active_leases(), 0);
        assert_eq!(framework.disposals(), 0);
    }

    #[test]
    fn test_failed_initialize_disposes_started_framework() {
        let framework = Arc::new(MockFramework::failing_initialize("shader compile"));
        let scope = FrameworkScope::new(framework.clone());

        for attempt in 1..=2 {
            match scope.acquire() {
                Err(BridgeError::FrameworkInit(msg)) => assert!(msg.contains("shader compile")),
                other => panic!("expected FrameworkInit, got {:?}", other),
            }
            assert_eq!(framework.startups(), attempt);
            assert_eq!(framework.disposals(), attempt);
        }
        assert_eq!(scope.active_leases(), 0);
    }

    #[test]
    fn test_concurrent_acquire_starts_once() {
        let framework = Arc::new(MockFramework::default());
        let scope = FrameworkScope::new(framework.clone());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let scope = Arc::clone(&scope);
                std::thread::spawn(move || scope.acquire().unwrap())
            })
            .collect();
        let leases: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(framework.startups(), 1);
        drop(leases);
        assert_eq!(framework.disposals(), 1);
    }
}
