//! Task id generation.

use ulid::Ulid;

use super::Clock;
use crate::domain::TaskId;

/// Mints fresh task ids.
pub trait IdGenerator: Send + Sync {
    fn next_task_id(&self) -> TaskId;
}

/// ULID-based generator.
///
/// The timestamp half comes from the injected clock, so a pinned clock in
/// tests yields ids whose time component is deterministic while the random
/// half still keeps them unique.
pub struct UlidIdGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidIdGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidIdGenerator<C> {
    fn next_task_id(&self) -> TaskId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        TaskId::from_ulid(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
