//! Explicit construction context threaded through every preprocessing call.
//!
//! There is no ambient "current allocator": callers hand a [`ComputeContext`]
//! to each factory, and the buffers a preprocessed table allocates are
//! accounted against the context's [`MemoryTracker`] for as long as the table
//! lives.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::logging::LogContext;

/// Shared byte counter for buffers owned by preprocessed tables.
#[derive(Clone, Debug, Default)]
pub struct MemoryTracker {
    allocated: Arc<AtomicUsize>,
}

impl MemoryTracker {
    /// Bytes currently held by live reservations.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    pub(crate) fn reserve(&self, bytes: usize) -> Reservation {
        self.allocated.fetch_add(bytes, Ordering::AcqRel);
        Reservation {
            tracker: self.clone(),
            bytes,
        }
    }
}

/// Accounting handle released when dropped.
#[derive(Debug)]
pub(crate) struct Reservation {
    tracker: MemoryTracker,
    bytes: usize,
}

impl Reservation {
    pub(crate) fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.tracker
            .allocated
            .fetch_sub(self.bytes, Ordering::AcqRel);
    }
}

/// Context for one comparison session.
#[derive(Clone, Debug, Default)]
pub struct ComputeContext {
    memory: MemoryTracker,
    log: LogContext,
}

impl ComputeContext {
    /// Fresh context with its own memory tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account allocations against an existing tracker.
    pub fn with_memory_tracker(self, memory: MemoryTracker) -> Self {
        Self { memory, ..self }
    }

    /// Append common key/value pairs to every log event emitted under this context.
    pub fn with_log_context(self, log: LogContext) -> Self {
        Self { log, ..self }
    }

    /// Tracker receiving this context's reservations.
    pub fn memory(&self) -> &MemoryTracker {
        &self.memory
    }

    pub(crate) fn log(&self) -> &LogContext {
        &self.log
    }
}
