//! Protocol state machine
//!
//! The AD5592R's MISO word is not self-describing: its meaning depends on
//! what earlier requests asked for. [`DecoderContext`] captures everything
//! needed to label the next response. It is a plain value, replaced as a
//! whole at every transaction boundary:
//!
//! ```text
//! let (response, after) = context.respond();   // label this MISO word
//! let next = after.advance(register, &request); // apply this MOSI word
//! ```
//!
//! The response is classified before the request is applied because the
//! device answers the *previous* transaction.

use super::catalog::{
    self, RegisterDescriptor, RequestKind, ReturnFormat, ADC_CHANNEL_BITS, ADC_REPEAT_BITS,
    ADC_TEMP_BITS, REG_READ_ENABLE_BITS, RESET_KEY, RESET_KEY_BITS,
};
use super::fields::TransactionWord;

/// How the next MISO word can be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// No usable context
    #[default]
    Invalid,
    /// Response echoes a single requested register or DAC channel
    Readback,
    /// Responses are samples of an ongoing acquisition
    AdcOp,
}

/// A request word resolved against its catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// No effect on response interpretation
    Write,
    /// Next response is a single readback in the given format
    Readback(ReturnFormat),
    /// Arm an acquisition over the selected channels
    Acquire {
        channels: u8,
        temperature: bool,
        repeat: bool,
    },
    /// Device reset: forget everything
    Reset,
    /// Opcode with no catalog entry
    Unrecognized,
}

impl Request {
    /// Resolve the register's category using the word's field values
    pub fn resolve(register: &RegisterDescriptor, word: &TransactionWord) -> Self {
        match register.kind {
            RequestKind::PlainWrite => Request::Write,
            RequestKind::DacReadback => Request::Readback(ReturnFormat::DacDataRd),
            RequestKind::RegisterReadback => {
                if word.field(REG_READ_ENABLE_BITS) == 1 {
                    Request::Readback(ReturnFormat::RegRead)
                } else {
                    Request::Write
                }
            }
            RequestKind::SequenceStart => Request::Acquire {
                channels: word.field(ADC_CHANNEL_BITS) as u8,
                temperature: word.field(ADC_TEMP_BITS) == 1,
                repeat: word.field(ADC_REPEAT_BITS) == 1,
            },
            RequestKind::Reconfigure => Request::Acquire {
                channels: word.field(ADC_CHANNEL_BITS) as u8,
                temperature: false,
                repeat: false,
            },
            RequestKind::SoftwareReset => {
                if word.field(RESET_KEY_BITS) == RESET_KEY {
                    Request::Reset
                } else {
                    Request::Write
                }
            }
        }
    }
}

/// Label chosen for a MISO word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Nothing meaningful on MISO
    Invalid,
    Format(ReturnFormat),
}

impl Response {
    pub fn label(self) -> &'static str {
        match self {
            Response::Invalid => "Invalid data",
            Response::Format(format) => format.label(),
        }
    }

    pub fn fields(self) -> &'static [catalog::FieldDescriptor] {
        match self {
            Response::Invalid => &[],
            Response::Format(format) => format.fields(),
        }
    }
}

/// Everything needed to interpret upcoming MISO words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderContext {
    pub state: State,
    /// Control register most recently addressed on MOSI
    pub last_register: Option<&'static str>,
    /// Format of the pending readback
    pub return_format: Option<ReturnFormat>,
    /// Temperature sample leads each acquisition round
    pub temperature: bool,
    /// Acquisition restarts after its last sample
    pub repeat: bool,
    /// Valid samples received since the acquisition was armed
    pub sample_index: u64,
    /// Samples per acquisition round
    pub sequence_len: u64,
    /// One stale response is still due before the first sample
    pub pipeline_delay: bool,
}

impl DecoderContext {
    /// Classify the MISO word of the current transaction.
    ///
    /// Returns the label and the context with pipeline delay / sample
    /// progress updated.
    pub fn respond(self) -> (Response, DecoderContext) {
        match self.state {
            State::Invalid => (Response::Invalid, self),
            State::Readback => {
                let Some(format) = self.return_format else {
                    unreachable!("readback state without a return format");
                };
                (Response::Format(format), self)
            }
            State::AdcOp => {
                if self.pipeline_delay {
                    return (
                        Response::Invalid,
                        DecoderContext {
                            pipeline_delay: false,
                            ..self
                        },
                    );
                }
                let Some(position) = self.sample_index.checked_rem(self.sequence_len) else {
                    unreachable!("acquisition armed with an empty sequence");
                };
                let format = if position == 0 && self.temperature {
                    ReturnFormat::TmpSenseResult
                } else {
                    ReturnFormat::AdcResult
                };
                (
                    Response::Format(format),
                    DecoderContext {
                        sample_index: self.sample_index + 1,
                        ..self
                    },
                )
            }
        }
    }

    /// Apply the current transaction's request.
    ///
    /// `register` is the control register name addressed by the request,
    /// `None` for DAC writes and unrecognized opcodes.
    pub fn advance(self, register: Option<&'static str>, request: &Request) -> DecoderContext {
        let last_register = register.or(self.last_register);

        match *request {
            Request::Unrecognized | Request::Reset => DecoderContext {
                last_register,
                ..DecoderContext::default()
            },
            Request::Readback(format) => DecoderContext {
                state: State::Readback,
                last_register,
                return_format: Some(format),
                ..self
            },
            Request::Acquire {
                channels,
                temperature,
                repeat,
            } => {
                let sequence_len = u64::from(channels.count_ones()) + u64::from(temperature);
                if sequence_len == 0 {
                    // Empty selection resets the readings
                    return DecoderContext {
                        state: State::Invalid,
                        last_register,
                        ..self
                    };
                }
                DecoderContext {
                    state: State::AdcOp,
                    last_register,
                    return_format: None,
                    temperature,
                    repeat,
                    sample_index: 0,
                    sequence_len,
                    pipeline_delay: true,
                }
            }
            Request::Write => {
                let state = match self.state {
                    State::AdcOp if self.repeat || self.sample_index < self.sequence_len => {
                        State::AdcOp
                    }
                    _ => State::Invalid,
                };
                DecoderContext {
                    state,
                    last_register,
                    ..self
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acquire(channels: u8, temperature: bool, repeat: bool) -> Request {
        Request::Acquire {
            channels,
            temperature,
            repeat,
        }
    }

    /// Run one transaction worth of state updates
    fn step(ctx: DecoderContext, request: Request) -> (Response, DecoderContext) {
        let (response, after) = ctx.respond();
        (response, after.advance(None, &request))
    }

    #[test]
    fn test_initial_state_is_invalid() {
        let ctx = DecoderContext::default();
        assert_eq!(ctx.state, State::Invalid);
        assert_eq!(ctx.respond().0, Response::Invalid);
    }

    #[test]
    fn test_acquisition_with_temperature() {
        let ctx = DecoderContext::default().advance(Some("ADC_SEQ"), &acquire(0b101, true, false));
        assert_eq!(ctx.state, State::AdcOp);
        assert_eq!(ctx.sequence_len, 3);
        assert!(ctx.pipeline_delay);

        let mut labels = Vec::new();
        let mut ctx = ctx;
        for _ in 0..4 {
            let (response, next) = step(ctx, Request::Write);
            labels.push(response.label());
            ctx = next;
        }
        assert_eq!(
            labels,
            vec!["Invalid data", "TMP_SENSE_RESULT", "ADC_RESULT", "ADC_RESULT"]
        );
        assert_eq!(ctx.state, State::Invalid);
    }

    #[test]
    fn test_repeat_keeps_cycling() {
        let mut ctx = DecoderContext::default().advance(None, &acquire(0b1, true, true));
        let mut labels = Vec::new();
        for _ in 0..6 {
            let (response, next) = step(ctx, Request::Write);
            labels.push(response.label());
            ctx = next;
        }
        assert_eq!(
            labels,
            vec![
                "Invalid data",
                "TMP_SENSE_RESULT",
                "ADC_RESULT",
                "TMP_SENSE_RESULT",
                "ADC_RESULT",
                "TMP_SENSE_RESULT"
            ]
        );
        assert_eq!(ctx.state, State::AdcOp);
    }

    #[test]
    fn test_empty_selection_resets_readings() {
        let armed = DecoderContext::default().advance(None, &acquire(0b11, false, false));
        assert_eq!(armed.state, State::AdcOp);
        let reset = armed.advance(None, &acquire(0, false, false));
        assert_eq!(reset.state, State::Invalid);
        // Repeat alone selects nothing to sample
        let reset = armed.advance(None, &acquire(0, false, true));
        assert_eq!(reset.state, State::Invalid);
    }

    #[test]
    fn test_temperature_only_sequence() {
        let ctx = DecoderContext::default().advance(None, &acquire(0, true, false));
        assert_eq!(ctx.sequence_len, 1);
        let (_, ctx) = step(ctx, Request::Write);
        let (response, ctx) = step(ctx, Request::Write);
        assert_eq!(response, Response::Format(ReturnFormat::TmpSenseResult));
        assert_eq!(ctx.state, State::Invalid);
    }

    #[test]
    fn test_readback_is_consumed_once() {
        let ctx = DecoderContext::default().advance(Some("DAC_RD"), &Request::Readback(ReturnFormat::DacDataRd));
        assert_eq!(ctx.state, State::Readback);
        let (response, ctx) = step(ctx, Request::Write);
        assert_eq!(response, Response::Format(ReturnFormat::DacDataRd));
        assert_eq!(ctx.state, State::Invalid);
        assert_eq!(ctx.respond().0, Response::Invalid);
    }

    #[test]
    fn test_readback_back_to_back() {
        let ctx = DecoderContext::default().advance(None, &Request::Readback(ReturnFormat::DacDataRd));
        let (_, ctx) = step(ctx, Request::Readback(ReturnFormat::RegRead));
        assert_eq!(ctx.state, State::Readback);
        assert_eq!(ctx.respond().0, Response::Format(ReturnFormat::RegRead));
    }

    #[test]
    fn test_readback_interrupts_acquisition() {
        let ctx = DecoderContext::default().advance(None, &acquire(0xFF, false, true));
        let (_, ctx) = step(ctx, Request::Readback(ReturnFormat::DacDataRd));
        assert_eq!(ctx.state, State::Readback);
        assert_eq!(ctx.respond().0.label(), "DAC_DATA_RD");
    }

    #[test]
    fn test_rearm_mid_sequence() {
        let ctx = DecoderContext::default().advance(None, &acquire(0b111, false, false));
        let (_, ctx) = step(ctx, Request::Write);
        let (_, ctx) = step(ctx, acquire(0b1, false, false));
        assert_eq!(ctx.state, State::AdcOp);
        assert_eq!(ctx.sequence_len, 1);
        assert_eq!(ctx.sample_index, 0);
        assert!(ctx.pipeline_delay);
    }

    #[test]
    fn test_reset_and_unrecognized_clear_context() {
        let armed = DecoderContext::default().advance(Some("ADC_SEQ"), &acquire(0b1, true, true));
        let reset = armed.advance(Some("SW_RESET"), &Request::Reset);
        assert_eq!(
            reset,
            DecoderContext {
                last_register: Some("SW_RESET"),
                ..DecoderContext::default()
            }
        );
        let unknown = armed.advance(None, &Request::Unrecognized);
        assert_eq!(unknown.state, State::Invalid);
        assert_eq!(unknown.last_register, Some("ADC_SEQ"));
    }

    #[test]
    fn test_transitions_are_deterministic() {
        let requests = [
            acquire(0b1001, true, false),
            Request::Write,
            Request::Readback(ReturnFormat::DacDataRd),
            Request::Write,
            acquire(0, false, false),
            Request::Reset,
        ];
        let run = || {
            let mut ctx = DecoderContext::default();
            let mut trace = Vec::new();
            for request in &requests {
                let (response, next) = step(ctx, *request);
                trace.push((response, next));
                ctx = next;
            }
            trace
        };
        assert_eq!(run(), run());
    }
}
