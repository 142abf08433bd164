//! Typed channel endpoints connecting pipeline stages
//!
//! - [`Sender`] wraps values for a crossbeam channel and can explicitly
//!   signal end-of-stream.
//! - [`Receiver`] unwraps them transparently and caches end-of-stream so
//!   later calls keep returning `Shutdown`.

use crossbeam_channel::{Receiver as CrossbeamReceiver, SendError, Sender as CrossbeamSender};

use super::errors::{WorkError, WorkResult};

/// Channel message wrapper for end-of-stream signaling
///
/// Nodes never see this enum: `Sender::send()` wraps values in `Sample(T)`
/// and `Receiver::recv()` unwraps them.
enum ChannelMessage<T> {
    Sample(T),
    /// No more data will be sent
    EndOfStream,
}

/// Create a bounded channel pair with the given capacity
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (
        Sender {
            destination: Some(tx),
        },
        Receiver {
            receiver: rx,
            eos: false,
        },
    )
}

/// Sending half of a pipeline channel
pub struct Sender<T> {
    destination: Option<CrossbeamSender<ChannelMessage<T>>>,
}

impl<T> Sender<T> {
    /// A sender with no destination; every send succeeds and is dropped
    pub fn disconnected() -> Self {
        Self { destination: None }
    }

    /// Send a value downstream
    ///
    /// Fails only when the receiving side has been dropped.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let Some(dest) = &self.destination else {
            return Ok(());
        };
        match dest.send(ChannelMessage::Sample(value)) {
            Ok(()) => Ok(()),
            Err(SendError(ChannelMessage::Sample(v))) => Err(SendError(v)),
            Err(SendError(ChannelMessage::EndOfStream)) => {
                unreachable!("sent a sample, got end-of-stream back")
            }
        }
    }

    /// Signal end-of-stream
    ///
    /// The downstream receiver returns `WorkError::Shutdown` afterwards.
    pub fn close(&self) {
        if let Some(dest) = &self.destination {
            let _ = dest.send(ChannelMessage::EndOfStream);
        }
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            destination: self.destination.clone(),
        }
    }
}

/// Receiving half of a pipeline channel
pub struct Receiver<T> {
    receiver: CrossbeamReceiver<ChannelMessage<T>>,
    eos: bool,
}

impl<T> Receiver<T> {
    /// Blocking receive.
    ///
    /// Returns `Err(WorkError::Shutdown)` once end-of-stream has been seen
    /// or every sender has been dropped.
    pub fn recv(&mut self) -> WorkResult<T> {
        if self.eos {
            return Err(WorkError::Shutdown);
        }

        match self.receiver.recv() {
            Ok(ChannelMessage::Sample(item)) => Ok(item),
            Ok(ChannelMessage::EndOfStream) => {
                self.eos = true;
                tracing::debug!("Receiver::recv() - EndOfStream received");
                Err(WorkError::Shutdown)
            }
            Err(_) => {
                self.eos = true;
                tracing::debug!("Receiver::recv() - channel disconnected, returning Shutdown");
                Err(WorkError::Shutdown)
            }
        }
    }

    /// Drain everything until end-of-stream
    pub fn collect_all(&mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Ok(item) = self.recv() {
            items.push(item);
        }
        items
    }
}
