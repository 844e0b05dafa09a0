//! These models represent the objects passed between agents and providers
//!
//! The internal structs are converted to the wire format of the completion
//! service at the provider boundary (see `providers::utils`), so nothing
//! outside the providers module depends on any particular API shape.
pub mod message;
pub mod role;
pub mod thread;
pub mod tool;
