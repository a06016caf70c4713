// Domain layer modules
pub mod envelope;
pub mod invocation_result;
pub mod lookup_outcome;
pub mod message;
pub mod queue_ref;
pub mod send_outcome;

// Re-exports
pub use envelope::Envelope;
pub use invocation_result::{InvocationResult, InvocationStatus, WHOLE_BATCH_IDENTIFIER};
pub use lookup_outcome::LookupOutcome;
pub use message::{DecodeError, Message};
pub use queue_ref::{QueueRef, QueueRefError};
pub use send_outcome::SendOutcome;
