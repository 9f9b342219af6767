//! Capability-based invocation.
//!
//! Each teaching agent provides one capability; the registry tracks which
//! ones are enabled and how long they may run.

pub mod registry;
pub mod types;

pub use registry::{CapabilityMetadata, CapabilityRegistry};
pub use types::{Capability, GenerationSettings};
