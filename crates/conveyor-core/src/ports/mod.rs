//! Ports: the trait seams between the queue core and its collaborators
//! (storage, time, id generation, authorization).

pub mod access_control;
pub mod clock;
pub mod id_generator;
pub mod task_store;

pub use self::access_control::{AccessControl, Caller};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidIdGenerator};
pub use self::task_store::TaskStore;
