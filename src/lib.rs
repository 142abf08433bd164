//! AD5592R SPI transaction decoder
//!
//! Reconstructs the meaning of traffic to an Analog Devices AD5592R 12-bit
//! configurable ADC/DAC from a stream of bus-framing events: which control
//! register or DAC channel each 16-bit request addressed, what each field
//! means, and how to read the device's simultaneous response, whose meaning
//! depends on earlier requests.
//!
//! # Architecture
//!
//! - **Register catalog**: static field layouts for every opcode and response format
//! - **Field interpreter**: slices words into named, formatted fields
//! - **Transaction assembler**: collects bits between chip-select edges
//! - **Protocol state machine**: tracks readback and acquisition context
//! - **Runtime**: thread-per-node execution over crossbeam channels, so the
//!   decoder can sit behind any framing layer as a pipeline stage
//!
//! # Example
//!
//! ```
//! use ad5592r::{Ad5592rDecoder, AnnotationRow, transaction_events};
//!
//! let mut decoder = Ad5592rDecoder::new();
//! // ADC_SEQ on channels 0 and 2 with the temperature sensor
//! let annotations = decoder.decode_all(&transaction_events(0x1105, 0x0000, 0, 4));
//! assert_eq!(annotations[0].text, "ADC_SEQ");
//! assert!(annotations
//!     .iter()
//!     .any(|a| a.row == AnnotationRow::MisoRegister && a.text == "Invalid data"));
//! ```

use thiserror::Error;

pub mod nodes;
pub mod runtime;

// Re-export decoder data types
pub use nodes::decoders::{
    Annotation, AnnotationRow, BitEvent, DecoderContext, SpiEvent, State,
    partial_transaction_events, transaction_events,
};

// Re-export the decoder
pub use nodes::decoders::Ad5592rDecoder;

// Re-export streaming runtime components
pub use runtime::{ProcessNode, Receiver, Scheduler, Sender, WorkError, WorkResult, bounded};

/// Register catalog consistency errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Field {field} of {register} has zero width")]
    EmptyField { register: String, field: String },

    #[error("Field {field} of {register} ({offset}+{width}) exceeds 16 bits")]
    FieldOutOfRange {
        register: String,
        field: String,
        offset: u8,
        width: u8,
    },

    #[error("Fields {first} and {second} of {register} overlap")]
    FieldOverlap {
        register: String,
        first: String,
        second: String,
    },

    #[error("Opcode 0x{0:02X} has no register and is not marked absent")]
    MissingOpcode(u8),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
