//! Node trait for streaming processing
//!
//! Defines the ProcessNode trait that all pipeline stages implement.
//! Nodes actively process data when work() is called by the scheduler.

pub use super::channel::{Receiver, Sender};
pub use super::errors::{WorkError, WorkResult};

/// A processing stage with one typed input and one typed output
/// - Sources ignore their input (use `()` as the input type)
/// - Sinks ignore their output (use `()` as the output type)
pub trait ProcessNode: Send {
    /// Items consumed from the upstream channel
    type Input: Send + 'static;
    /// Items produced on the downstream channel
    type Output: Send + Clone + 'static;

    /// Get a debug name for this node
    fn name(&self) -> &str;

    /// Check if this node should stop processing
    fn should_stop(&self) -> bool {
        false
    }

    /// Do work: read from the input, process, write to the output
    /// Returns Ok(n) where n is the number of items produced, or Err on failure.
    /// `Err(WorkError::Shutdown)` is the normal end-of-stream signal.
    fn work(
        &mut self,
        input: &mut Receiver<Self::Input>,
        output: &Sender<Self::Output>,
    ) -> WorkResult<usize>;
}
