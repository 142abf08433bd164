//! Field interpreter: bit slicing and field annotation
//!
//! A [`TransactionWord`] stores its sixteen bits LSB-first, i.e. reversed
//! relative to the order the bus clocked them, so field offsets index the
//! storage directly. The highest-offset bit of a slice is therefore the
//! chronologically earliest one.

use super::catalog::{BitRange, FieldDescriptor};
use super::types::{Annotation, AnnotationRow, BitEvent};
use tracing::trace;

/// Number of bits in every AD5592R transaction
pub const WORD_BITS: usize = 16;

/// Value of a bit slice and the sample span its bits cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extracted {
    pub value: u32,
    pub start_sample: u64,
    pub end_sample: u64,
}

/// One direction of a completed transaction, LSB at index 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionWord {
    bits: [BitEvent; WORD_BITS],
}

impl TransactionWord {
    /// Build a word from bits in bus order (MSB first).
    ///
    /// Returns None unless exactly sixteen bits are given.
    pub fn from_msb_first(bits: &[BitEvent]) -> Option<Self> {
        let mut lsb_first: [BitEvent; WORD_BITS] = bits.try_into().ok()?;
        lsb_first.reverse();
        Some(Self { bits: lsb_first })
    }

    /// Numeric value of the whole word
    pub fn value(&self) -> u16 {
        self.bits
            .iter()
            .enumerate()
            .fold(0u16, |acc, (i, bit)| acc | (u16::from(bit.value) << i))
    }

    /// Sample span of the whole word, first clocked bit to last
    pub fn span(&self) -> (u64, u64) {
        (
            self.bits[WORD_BITS - 1].start_sample,
            self.bits[0].end_sample,
        )
    }

    /// Slice `width` bits starting at LSB-relative `offset`.
    ///
    /// # Panics
    /// Panics if the slice is empty or extends past bit 15; catalog
    /// descriptors are validated to never do that.
    pub fn extract(&self, offset: usize, width: usize) -> Extracted {
        let slice = &self.bits[offset..offset + width];
        let value = slice
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, bit)| acc | (u32::from(bit.value) << i));

        Extracted {
            value,
            start_sample: slice[width - 1].start_sample,
            end_sample: slice[0].end_sample,
        }
    }

    /// [`extract`](Self::extract) over a catalog bit range
    pub fn extract_range(&self, range: BitRange) -> Extracted {
        self.extract(usize::from(range.offset), usize::from(range.width))
    }

    /// Value-only shorthand for [`extract_range`](Self::extract_range)
    pub fn field(&self, range: BitRange) -> u32 {
        self.extract_range(range).value
    }
}

/// Render one field: name alone when the formatter has nothing to say
pub fn field_text(field: &FieldDescriptor, value: u32) -> String {
    let formatted = field.formatter.apply(value);
    let mut text = if formatted.is_empty() {
        field.name.to_string()
    } else {
        format!("{}: {}", field.name, formatted)
    };
    if let Some(validator) = field.validator {
        if !validator.accepts(value) {
            text.push_str(" (unexpected)");
        }
    }
    text
}

/// Annotate every field of `fields` in order.
///
/// Emits nothing for an empty list.
pub fn annotate_fields(
    word: &TransactionWord,
    fields: &[FieldDescriptor],
    row: AnnotationRow,
) -> Vec<Annotation> {
    fields
        .iter()
        .map(|field| {
            let extracted = word.extract(usize::from(field.offset), usize::from(field.width));
            let ann = Annotation::new(
                extracted.start_sample,
                extracted.end_sample,
                row,
                field_text(field, extracted.value),
            );
            trace!("{}", ann);
            ann
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::decoders::catalog::{self, Formatter, ReturnFormat};

    /// Word with bit i (MSB first) spanning samples [10*i, 10*i + 9]
    fn word(value: u16) -> TransactionWord {
        let bits: Vec<_> = (0..16)
            .map(|i| {
                let start = i as u64 * 10;
                BitEvent::new((value >> (15 - i)) & 1 == 1, start, start + 9)
            })
            .collect();
        TransactionWord::from_msb_first(&bits).unwrap()
    }

    #[test]
    fn test_word_requires_sixteen_bits() {
        let bits = vec![BitEvent::new(true, 0, 1); 14];
        assert!(TransactionWord::from_msb_first(&bits).is_none());
        let bits = vec![BitEvent::new(true, 0, 1); 17];
        assert!(TransactionWord::from_msb_first(&bits).is_none());
    }

    #[test]
    fn test_word_value_and_span() {
        let w = word(0xA5C3);
        assert_eq!(w.value(), 0xA5C3);
        assert_eq!(w.span(), (0, 159));
        // LSB is the last bit clocked
        assert_eq!(w.extract(0, 1).start_sample, 150);
    }

    #[test]
    fn test_extract_value_and_timing() {
        let w = word(0b0001_0000_0000_0101);
        let low = w.extract(0, 8);
        assert_eq!(low.value, 0b0000_0101);
        // bits 7..0 were clocked 9th to 16th
        assert_eq!((low.start_sample, low.end_sample), (80, 159));

        let msb = w.extract(15, 1);
        assert_eq!(msb.value, 0);
        assert_eq!((msb.start_sample, msb.end_sample), (0, 9));

        assert_eq!(w.field(catalog::CONTROL_ADDR_BITS), 0b0010);
    }

    #[test]
    fn test_catalog_fields_decode_what_was_encoded() {
        let mut lists: Vec<&[FieldDescriptor]> = (0..16u8)
            .filter_map(catalog::control_register)
            .map(|reg| reg.fields)
            .collect();
        lists.push(catalog::DAC_WRITE.fields);
        lists.extend(ReturnFormat::ALL.iter().map(|f| f.fields()));

        for field in lists.into_iter().flatten() {
            for value in 0..(1u32 << field.width) {
                let encoded = (value << field.offset) as u16;
                let (offset, width) = (usize::from(field.offset), usize::from(field.width));
                assert_eq!(word(encoded).extract(offset, width).value, value, "field {}", field.name);
                // Neighbouring bits must not leak in
                let noisy = encoded | !(field.mask() as u16);
                assert_eq!(word(noisy).extract(offset, width).value, value, "field {}", field.name);
            }
        }
    }

    #[test]
    fn test_field_text_rules() {
        let plain = FieldDescriptor::new(0, 12, "DAC data");
        assert_eq!(field_text(&plain, 2048), "DAC data: 2048");

        let empty = FieldDescriptor::formatted(12, 4, "TEMPSENSE_ADDR", Formatter::Empty);
        assert_eq!(field_text(&empty, 8), "TEMPSENSE_ADDR");

        let reserved = FieldDescriptor::reserved(8, 3);
        assert_eq!(field_text(&reserved, 0), "RESERVED");
        assert_eq!(field_text(&reserved, 2), "RESERVED (unexpected)");

        let channels = FieldDescriptor::formatted(0, 8, "ADC Channels", Formatter::BitIndices);
        assert_eq!(field_text(&channels, 0), "ADC Channels");
        assert_eq!(field_text(&channels, 0b101), "ADC Channels: 0,2");
    }

    #[test]
    fn test_annotate_fields() {
        let w = word(0b1011_0000_0000_1010);
        let anns = annotate_fields(&w, catalog::DAC_WRITE.fields, AnnotationRow::MosiField);
        assert_eq!(anns.len(), 2);
        assert_eq!(anns[0].text, "DAC data: 10");
        assert_eq!((anns[0].start_sample, anns[0].end_sample), (40, 159));
        assert_eq!(anns[1].text, "DAC addr: 3");
        assert_eq!((anns[1].start_sample, anns[1].end_sample), (10, 39));
        assert!(anns.iter().all(|a| a.row == AnnotationRow::MosiField));
    }

    #[test]
    fn test_annotate_empty_list_is_noop() {
        let anns = annotate_fields(&word(0xFFFF), ReturnFormat::RegRead.fields(), AnnotationRow::MisoField);
        assert!(anns.is_empty());
    }
}
