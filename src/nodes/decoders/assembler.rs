//! Transaction assembler
//!
//! Collects framing-layer bit events between chip-select edges and hands out
//! complete 16-bit transactions. CS is active-low:
//!   - 1 → 0 starts a transaction and clears the accumulators
//!   - 0 → 1 closes it; anything but exactly sixteen bits is discarded

use super::fields::{TransactionWord, WORD_BITS};
use super::types::BitEvent;
use tracing::{debug, trace};

/// Both directions of one completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub mosi: TransactionWord,
    pub miso: TransactionWord,
    /// Start of the first clocked MOSI bit
    pub start_sample: u64,
    /// End of the last clocked MOSI bit
    pub end_sample: u64,
}

/// Accumulates bits for the transaction in progress
#[derive(Debug, Default)]
pub struct TransactionAssembler {
    mosi: Vec<BitEvent>,
    miso: Vec<BitEvent>,
    bit_count: usize,
    discarded: u64,
}

impl TransactionAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one clock edge worth of data
    pub fn on_bit(&mut self, mosi: BitEvent, miso: BitEvent) {
        trace!(
            "bit {}: MOSI={} MISO={} at {}",
            self.bit_count,
            u8::from(mosi.value),
            u8::from(miso.value),
            mosi.start_sample
        );
        // Only the count matters past sixteen bits: the frame is discarded
        if self.bit_count < WORD_BITS {
            self.mosi.push(mosi);
            self.miso.push(miso);
        }
        self.bit_count += 1;
    }

    /// Handle a chip-select level change.
    ///
    /// Returns the completed transaction on a valid rising edge. An unknown
    /// previous level is never treated as an edge.
    pub fn on_select_edge(&mut self, previous: Option<bool>, new: bool) -> Option<Transaction> {
        match (previous, new) {
            (Some(true), false) => {
                self.clear();
                None
            }
            (Some(false), true) => self.close(),
            _ => None,
        }
    }

    /// Number of bits collected so far
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Number of frames dropped for having the wrong length
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn close(&mut self) -> Option<Transaction> {
        if self.bit_count != WORD_BITS {
            debug!(
                "Discarding malformed frame: {}/{} bits",
                self.bit_count, WORD_BITS
            );
            self.discarded += 1;
            self.clear();
            return None;
        }

        let transaction = match (
            TransactionWord::from_msb_first(&self.mosi),
            TransactionWord::from_msb_first(&self.miso),
        ) {
            (Some(mosi), Some(miso)) => {
                let (start_sample, end_sample) = mosi.span();
                Some(Transaction {
                    mosi,
                    miso,
                    start_sample,
                    end_sample,
                })
            }
            _ => None,
        };
        self.clear();
        transaction
    }

    fn clear(&mut self) {
        self.mosi.clear();
        self.miso.clear();
        self.bit_count = 0;
    }
}
