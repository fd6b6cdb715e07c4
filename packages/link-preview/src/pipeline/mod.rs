//! Resolution pipeline - the core of the engine.
//!
//! The pipeline orchestrates:
//! - Cache fast path and unconditional cache write
//! - Tier sequencing under a global deadline
//! - Per-tier timeouts and failure containment
//! - Bounded retry of transient network failures

pub mod deadline;
pub mod resolver;
pub mod retry;

pub use deadline::Deadline;
pub use resolver::Resolver;
pub use retry::{retry_if, with_retry};
