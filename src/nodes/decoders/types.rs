//! Common decoder types: framing-layer input events and annotation output

use std::fmt;

/// One sampled bit on a single SPI data line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitEvent {
    /// Line level at the sampling edge
    pub value: bool,
    /// First sample covered by this bit
    pub start_sample: u64,
    /// Last sample covered by this bit
    pub end_sample: u64,
}

impl BitEvent {
    /// Create a new bit event
    pub fn new(value: bool, start_sample: u64, end_sample: u64) -> Self {
        Self {
            value,
            start_sample,
            end_sample,
        }
    }
}

/// Event produced by the bus framing layer, in chronological order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiEvent {
    /// Chip select changed level. CS is active-low.
    /// `previous` is `None` when the level before the first edge is unknown.
    CsChange { previous: Option<bool>, new: bool },
    /// One clock edge: host→device and device→host bits captured together
    Bits { mosi: BitEvent, miso: BitEvent },
}

/// Output row of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationRow {
    /// Register addressed by the host
    MosiRegister,
    /// Field of the host's request word
    MosiField,
    /// Interpretation chosen for the device's response word
    MisoRegister,
    /// Field of the device's response word
    MisoField,
}

impl AnnotationRow {
    /// Row identifier as shown in annotation exports
    pub fn id(self) -> &'static str {
        match self {
            AnnotationRow::MosiRegister => "mosi-register",
            AnnotationRow::MosiField => "mosi-field",
            AnnotationRow::MisoRegister => "miso-register",
            AnnotationRow::MisoField => "miso-field",
        }
    }
}

/// A labeled sample range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub start_sample: u64,
    pub end_sample: u64,
    pub row: AnnotationRow,
    pub text: String,
}

impl Annotation {
    pub fn new(start_sample: u64, end_sample: u64, row: AnnotationRow, text: impl Into<String>) -> Self {
        Self {
            start_sample,
            end_sample,
            row,
            text: text.into(),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}-{} {}: {}",
            self.start_sample,
            self.end_sample,
            self.row.id(),
            self.text
        )
    }
}

/// Synthesize the framing layer's events for one 16-bit exchange.
///
/// Emits a CS falling edge, sixteen MSB-first bit events of
/// `samples_per_bit` samples each starting at `start_sample`, and the CS
/// rising edge. Used by demos and tests to stand in for a captured bus.
pub fn transaction_events(
    mosi: u16,
    miso: u16,
    start_sample: u64,
    samples_per_bit: u64,
) -> Vec<SpiEvent> {
    partial_transaction_events(mosi, miso, 16, start_sample, samples_per_bit)
}

/// Like [`transaction_events`] but only the first `bits` MSB-first bits are
/// clocked before chip select is released.
pub fn partial_transaction_events(
    mosi: u16,
    miso: u16,
    bits: usize,
    start_sample: u64,
    samples_per_bit: u64,
) -> Vec<SpiEvent> {
    let samples_per_bit = samples_per_bit.max(1);
    let mut events = Vec::with_capacity(bits + 2);
    events.push(SpiEvent::CsChange {
        previous: Some(true),
        new: false,
    });
    for i in 0..bits.min(16) {
        let shift = 15 - i;
        let start = start_sample + i as u64 * samples_per_bit;
        let end = start + samples_per_bit - 1;
        events.push(SpiEvent::Bits {
            mosi: BitEvent::new((mosi >> shift) & 1 == 1, start, end),
            miso: BitEvent::new((miso >> shift) & 1 == 1, start, end),
        });
    }
    events.push(SpiEvent::CsChange {
        previous: Some(false),
        new: true,
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_events_shape() {
        let events = transaction_events(0x8001, 0x0000, 100, 4);
        assert_eq!(events.len(), 18);
        assert_eq!(
            events[0],
            SpiEvent::CsChange {
                previous: Some(true),
                new: false
            }
        );
        match events[1] {
            SpiEvent::Bits { mosi, .. } => {
                assert!(mosi.value);
                assert_eq!((mosi.start_sample, mosi.end_sample), (100, 103));
            }
            _ => panic!("expected bits"),
        }
        match events[16] {
            SpiEvent::Bits { mosi, .. } => {
                assert!(mosi.value);
                assert_eq!(mosi.start_sample, 160);
            }
            _ => panic!("expected bits"),
        }
    }

    #[test]
    fn test_annotation_display() {
        let ann = Annotation::new(3, 9, AnnotationRow::MisoRegister, "Invalid data");
        assert_eq!(ann.to_string(), "3-9 miso-register: Invalid data");
    }
}
