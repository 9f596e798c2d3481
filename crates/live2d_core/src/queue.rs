//! Bounded command mailbox between the control plane and the render loop
//!
//! The only structure shared between threads. Producers are any number of
//! control-plane or input threads; the single consumer is the render loop.
//! Full queues reject new commands rather than dropping old ones so the
//! caller always learns that a command was not taken.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::command::Command;
use crate::error::{BridgeError, Result};
use crate::lifecycle::Phase;
use crate::router::Ack;

/// A command tagged with its admission order
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub sequence: u64,
    pub command: Command,
}

struct QueueInner {
    items: VecDeque<Envelope>,
    next_sequence: u64,
    /// Set by dispose; closed queues accept nothing
    closed: bool,
}

/// Bounded FIFO with reject-on-full backpressure
pub struct CommandQueue {
    inner: Mutex<QueueInner>,
    capacity: usize,
}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::with_capacity(capacity),
                next_sequence: 1,
                closed: false,
            }),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        // A panic while holding the lock cannot leave the deque half-updated
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Admit a command
    ///
    /// Fails with `QueueFull` at capacity and with `NotReady(Disposed)` once
    /// the queue is closed.
    pub fn push(&self, command: Command) -> Result<Ack> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(BridgeError::NotReady(Phase::Disposed));
        }
        if inner.items.len() >= self.capacity {
            return Err(BridgeError::QueueFull {
                capacity: self.capacity,
            });
        }
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.items.push_back(Envelope { sequence, command });
        Ok(Ack { sequence })
    }

    /// Take up to `max` commands in FIFO order
    pub fn drain(&self, max: usize) -> Vec<Envelope> {
        let mut inner = self.lock();
        let count = max.min(inner.items.len());
        inner.items.drain(..count).collect()
    }

    /// Close the queue and discard whatever is still waiting
    ///
    /// Returns the number of discarded commands. Safe to call repeatedly.
    pub fn close(&self) -> usize {
        let mut inner = self.lock();
        inner.closed = true;
        let discarded = inner.items.len();
        inner.items.clear();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn scale(factor: f32) -> Command {
        Command::SetScale { factor }
    }

    #[test]
    fn test_fifo_and_sequence() {
        let queue = CommandQueue::new(4);
        let a = queue.push(scale(1.0)).unwrap();
        let b = queue.push(scale(2.0)).unwrap();
        assert!(b.sequence > a.sequence);

        let drained = queue.drain(10);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].command, scale(1.0));
        assert_eq!(drained[1].command, scale(2.0));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reject_on_full() {
        let queue = CommandQueue::new(2);
        queue.push(scale(1.0)).unwrap();
        queue.push(scale(2.0)).unwrap();
        assert_eq!(
            queue.push(scale(3.0)),
            Err(BridgeError::QueueFull { capacity: 2 })
        );
        assert_eq!(queue.len(), 2);
        // The oldest command survives
        assert_eq!(queue.drain(1)[0].command, scale(1.0));
        assert!(queue.push(scale(4.0)).is_ok());
    }

    #[test]
    fn test_bounded_drain_defers_remainder() {
        let queue = CommandQueue::new(8);
        for i in 0..5 {
            queue.push(scale(i as f32)).unwrap();
        }
        assert_eq!(queue.drain(3).len(), 3);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.drain(3)[0].command, scale(3.0));
    }

    #[test]
    fn test_close_discards_and_rejects() {
        let queue = CommandQueue::new(4);
        queue.push(scale(1.0)).unwrap();
        assert_eq!(queue.close(), 1);
        assert!(queue.is_empty());
        assert_eq!(
            queue.push(scale(2.0)),
            Err(BridgeError::NotReady(Phase::Disposed))
        );
        assert_eq!(queue.close(), 0);
    }

    #[test]
    fn test_concurrent_producers_never_exceed_capacity() {
        let queue = Arc::new(CommandQueue::new(16));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    (0..10)
                        .filter(|i| queue.push(scale((t * 10 + i) as f32)).is_ok())
                        .count()
                })
            })
            .collect();
        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(accepted, 16);
        assert_eq!(queue.len(), 16);

        let drained = queue.drain(usize::MAX);
        let mut sequences: Vec<u64> = drained.iter().map(|e| e.sequence).collect();
        let sorted = {
            let mut s = sequences.clone();
            s.sort_unstable();
            s
        };
        assert_eq!(sequences, sorted);
        sequences.dedup();
        assert_eq!(sequences.len(), 16);
    }
}
