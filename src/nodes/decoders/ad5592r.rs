//! AD5592R transaction decoder
//!
//! Turns framing-layer [`SpiEvent`]s into [`Annotation`]s on four rows:
//!   1. Bits accumulate in the [`TransactionAssembler`] until CS is released
//!   2. The MOSI word is labeled from the register catalog
//!   3. The MISO word is labeled from the current [`DecoderContext`]
//!   4. The context advances according to the MOSI request
//!
//! Processing is a strict fold over the event stream; the decoder can be
//! driven directly with [`Ad5592rDecoder::decode`] or run as a pipeline stage
//! through [`ProcessNode`].

use super::assembler::{Transaction, TransactionAssembler};
use super::catalog::{self, FieldDescriptor, Formatter, CONTROL_ADDR_BITS, DAC_ADDR_BITS, MSB_BITS};
use super::fields::{annotate_fields, TransactionWord};
use super::state::{DecoderContext, Request};
use super::types::{Annotation, AnnotationRow, SpiEvent};
use crate::runtime::node::{ProcessNode, Receiver, Sender, WorkResult};
use tracing::{debug, trace};

/// MOSI word resolved against the catalog
struct DecodedRequest {
    label: String,
    fields: &'static [FieldDescriptor],
    /// Control register name, `None` for DAC writes and unknown opcodes
    register: Option<&'static str>,
    request: Request,
}

fn decode_request(word: &TransactionWord) -> DecodedRequest {
    if word.field(MSB_BITS) == 0 {
        let opcode = word.field(CONTROL_ADDR_BITS);
        match catalog::control_register(opcode as u8) {
            Some(reg) => DecodedRequest {
                label: reg.name.to_string(),
                fields: reg.fields,
                register: Some(reg.name),
                request: Request::resolve(reg, word),
            },
            None => {
                debug!("Unrecognized control register opcode 0b{:04b}", opcode);
                DecodedRequest {
                    label: format!("Unrecognized register: {}", Formatter::Hex.apply(opcode)),
                    fields: &[],
                    register: None,
                    request: Request::Unrecognized,
                }
            }
        }
    } else {
        let address = word.field(DAC_ADDR_BITS);
        match catalog::dac_channel(address as u8) {
            Some(reg) => DecodedRequest {
                label: format!("DAC{} Write", address),
                fields: reg.fields,
                register: None,
                request: Request::resolve(reg, word),
            },
            None => {
                debug!("Unrecognized DAC address {}", address);
                DecodedRequest {
                    label: format!("Unrecognized DAC address: {}", address),
                    fields: &[],
                    register: None,
                    request: Request::Unrecognized,
                }
            }
        }
    }
}

/// Stateful decoder for one AD5592R on one SPI bus
pub struct Ad5592rDecoder {
    name: String,
    assembler: TransactionAssembler,
    context: DecoderContext,
    tx_count: u64,
}

impl Ad5592rDecoder {
    /// Create a decoder with no prior context
    ///
    /// # Panics
    /// In debug builds, panics if the register catalog is inconsistent.
    pub fn new() -> Self {
        if cfg!(debug_assertions) {
            if let Err(e) = catalog::validate() {
                panic!("AD5592R register catalog is inconsistent: {}", e);
            }
        }
        Self {
            name: "ad5592r_decoder".to_string(),
            assembler: TransactionAssembler::new(),
            context: DecoderContext::default(),
            tx_count: 0,
        }
    }

    /// With custom name, used in log lines and as the pipeline thread name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Snapshot of the protocol context
    pub fn context(&self) -> DecoderContext {
        self.context
    }

    /// Number of transactions decoded so far
    pub fn transactions(&self) -> u64 {
        self.tx_count
    }

    /// Number of frames discarded for having the wrong length
    pub fn discarded(&self) -> u64 {
        self.assembler.discarded()
    }

    /// Forget the transaction in progress and all protocol context
    pub fn reset(&mut self) {
        debug!("[{}] Reset", self.name);
        self.assembler = TransactionAssembler::new();
        self.context = DecoderContext::default();
    }

    /// Feed one framing-layer event.
    ///
    /// Returns the annotations of the transaction it completed, if any.
    pub fn decode(&mut self, event: &SpiEvent) -> Vec<Annotation> {
        match *event {
            SpiEvent::Bits { mosi, miso } => {
                self.assembler.on_bit(mosi, miso);
                Vec::new()
            }
            SpiEvent::CsChange { previous, new } => {
                match self.assembler.on_select_edge(previous, new) {
                    Some(transaction) => self.decode_transaction(&transaction),
                    None => Vec::new(),
                }
            }
        }
    }

    /// Feed a whole event stream, collecting every annotation
    pub fn decode_all<'a>(&mut self, events: impl IntoIterator<Item = &'a SpiEvent>) -> Vec<Annotation> {
        events
            .into_iter()
            .flat_map(|event| self.decode(event))
            .collect()
    }

    /// Label both words of a completed transaction and advance the context
    pub fn decode_transaction(&mut self, transaction: &Transaction) -> Vec<Annotation> {
        let (start, end) = (transaction.start_sample, transaction.end_sample);
        let decoded = decode_request(&transaction.mosi);

        let mut annotations = vec![Annotation::new(
            start,
            end,
            AnnotationRow::MosiRegister,
            decoded.label,
        )];
        annotations.extend(annotate_fields(
            &transaction.mosi,
            decoded.fields,
            AnnotationRow::MosiField,
        ));

        // MISO answers the previous request, so classify before advancing
        let before = self.context;
        let (response, after) = before.respond();
        annotations.push(Annotation::new(
            start,
            end,
            AnnotationRow::MisoRegister,
            response.label(),
        ));
        annotations.extend(annotate_fields(
            &transaction.miso,
            response.fields(),
            AnnotationRow::MisoField,
        ));

        self.context = after.advance(decoded.register, &decoded.request);
        self.tx_count += 1;

        debug!(
            "[{}] #{}: MOSI=0x{:04X} MISO=0x{:04X} ({}) {:?} -> {:?}",
            self.name,
            self.tx_count,
            transaction.mosi.value(),
            transaction.miso.value(),
            response.label(),
            before.state,
            self.context.state,
        );
        trace!("[{}] context: {:?}", self.name, self.context);

        annotations
    }
}

impl Default for Ad5592rDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessNode for Ad5592rDecoder {
    type Input = SpiEvent;
    type Output = Annotation;

    fn name(&self) -> &str {
        &self.name
    }

    fn work(&mut self, input: &mut Receiver<SpiEvent>, output: &Sender<Annotation>) -> WorkResult<usize> {
        let event = input.recv()?;
        let annotations = self.decode(&event);
        let produced = annotations.len();
        for annotation in annotations {
            output.send(annotation)?;
        }
        Ok(produced)
    }
}
