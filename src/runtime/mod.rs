//! Runtime support for streaming decoder pipelines

pub mod channel;
pub mod errors;
pub mod node;
pub mod scheduler;

pub use channel::{Receiver, Sender, bounded};
pub use errors::{WorkError, WorkResult};
pub use node::ProcessNode;
pub use scheduler::Scheduler;
