//! Streaming decoder nodes
//!
//! Nodes consume framing-layer events from a channel and emit annotations:
//! - **Decoders**: the AD5592R transaction decoder and its building blocks
//!
//! # Examples
//!
//! ```
//! use ad5592r::nodes::decoders::{Ad5592rDecoder, transaction_events};
//!
//! let mut decoder = Ad5592rDecoder::new();
//! let annotations = decoder.decode_all(&transaction_events(0xB7FF, 0x0000, 0, 4));
//! assert_eq!(annotations[0].text, "DAC3 Write");
//! ```

pub mod decoders;
