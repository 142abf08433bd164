//! Protocol decoder nodes
//!
//! The AD5592R decoder and the pieces it is built from.

pub mod ad5592r;
pub mod assembler;
pub mod catalog;
pub mod fields;
pub mod state;
pub mod types;

// Re-export common types
pub use types::{
    Annotation, AnnotationRow, BitEvent, SpiEvent, partial_transaction_events, transaction_events,
};

// Re-export decoder components
pub use ad5592r::Ad5592rDecoder;
pub use assembler::{Transaction, TransactionAssembler};
pub use catalog::{FieldDescriptor, Formatter, RegisterDescriptor, RequestKind, ReturnFormat};
pub use fields::{Extracted, TransactionWord, annotate_fields};
pub use state::{DecoderContext, Request, Response, State};
