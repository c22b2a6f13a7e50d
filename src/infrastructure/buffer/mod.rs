//! Event buffer between redirect handlers and the flush worker.
//!
//! Provides an [`EventBuffer`] trait with two implementations:
//! - [`RedisEventBuffer`] - Shared Redis list (production)
//! - [`MemoryEventBuffer`] - Process-local queue (no Redis, tests)

mod memory_buffer;
mod redis_buffer;
mod service;

pub use memory_buffer::MemoryEventBuffer;
pub use redis_buffer::RedisEventBuffer;
pub use service::{BufferError, BufferResult, EventBuffer};

#[cfg(test)]
pub use service::MockEventBuffer;
