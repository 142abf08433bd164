//! AD5592R register catalog
//!
//! Static descriptors for every control-register opcode, the DAC write
//! layout shared by all eight channels, and the formats the device uses on
//! MISO. Bit offsets are relative to the word's LSB.
//!
//! ```text
//! Control register write     DAC write
//! [15]    0                  [15]    1
//! [14:11] opcode             [14:12] DAC channel
//! [10:0]  register payload   [11:0]  DAC data
//! ```

use crate::{DecodeError, Result};

/// A contiguous bit slice of a 16-bit word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub offset: u8,
    pub width: u8,
}

impl BitRange {
    pub const fn new(offset: u8, width: u8) -> Self {
        Self { offset, width }
    }
}

/// Discriminates control-register writes (0) from DAC writes (1)
pub const MSB_BITS: BitRange = BitRange::new(15, 1);
/// Opcode of a control-register write
pub const CONTROL_ADDR_BITS: BitRange = BitRange::new(11, 4);
/// Channel of a DAC write
pub const DAC_ADDR_BITS: BitRange = BitRange::new(12, 3);

/// `REG_RD_EN` of `CONFIG_READ_AND_LDAC`
pub const REG_READ_ENABLE_BITS: BitRange = BitRange::new(6, 1);
/// Channel mask of `ADC_SEQ` / `ADC_CONFIG`
pub const ADC_CHANNEL_BITS: BitRange = BitRange::new(0, 8);
/// Temperature indicator of `ADC_SEQ`
pub const ADC_TEMP_BITS: BitRange = BitRange::new(8, 1);
/// Repeat flag of `ADC_SEQ`
pub const ADC_REPEAT_BITS: BitRange = BitRange::new(9, 1);
/// Payload of `SW_RESET`
pub const RESET_KEY_BITS: BitRange = BitRange::new(0, 11);
/// `SW_RESET` payload that actually resets the device
pub const RESET_KEY: u32 = 0x5AC;

/// Opcodes the device leaves unassigned
pub const ABSENT_OPCODES: [u8; 1] = [0b1110];

/// Rendering rule for a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    Decimal,
    Hex,
    EnabledDisabled,
    DacChannel,
    AdcChannel,
    /// Comma-separated indices of the set bits
    BitIndices,
    /// Output span selected by a range bit: Vref or 2xVref
    VrefRange,
    /// Field is shown by name only
    Empty,
}

impl Formatter {
    pub fn apply(self, value: u32) -> String {
        match self {
            Formatter::Decimal => value.to_string(),
            Formatter::Hex => format!("0x{:02X}", value),
            Formatter::EnabledDisabled => {
                if value == 0 {
                    "Disabled".to_string()
                } else {
                    "Enabled".to_string()
                }
            }
            Formatter::DacChannel => format!("DAC{}", value),
            Formatter::AdcChannel => format!("ADC{}", value),
            Formatter::BitIndices => (0..32u32)
                .filter(|bit| value & (1 << bit) != 0)
                .map(|bit| bit.to_string())
                .collect::<Vec<_>>()
                .join(","),
            Formatter::VrefRange => {
                if value == 0 {
                    "0V to Vref".to_string()
                } else {
                    "0V to 2xVref".to_string()
                }
            }
            Formatter::Empty => String::new(),
        }
    }
}

/// Sanity check applied to a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    MustBeZero,
}

impl Validator {
    pub fn accepts(self, value: u32) -> bool {
        match self {
            Validator::MustBeZero => value == 0,
        }
    }
}

/// One named bit field of a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub offset: u8,
    pub width: u8,
    pub name: &'static str,
    pub formatter: Formatter,
    pub validator: Option<Validator>,
}

impl FieldDescriptor {
    /// Field rendered as a decimal value
    pub const fn new(offset: u8, width: u8, name: &'static str) -> Self {
        Self::formatted(offset, width, name, Formatter::Decimal)
    }

    pub const fn formatted(offset: u8, width: u8, name: &'static str, formatter: Formatter) -> Self {
        Self {
            offset,
            width,
            name,
            formatter,
            validator: None,
        }
    }

    /// Reserved bits, expected to be written as zero
    pub const fn reserved(offset: u8, width: u8) -> Self {
        Self {
            offset,
            width,
            name: "RESERVED",
            formatter: Formatter::Empty,
            validator: Some(Validator::MustBeZero),
        }
    }

    pub const fn bits(&self) -> BitRange {
        BitRange::new(self.offset, self.width)
    }

    /// Mask of the bits this field covers within a 16-bit word
    pub fn mask(&self) -> u32 {
        ((1u32 << self.width) - 1) << self.offset
    }
}

/// How a request affects the interpretation of later MISO words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// No read or sequence semantics
    PlainWrite,
    /// `DAC_RD`: next response is the channel's DAC data
    DacReadback,
    /// `CONFIG_READ_AND_LDAC`: readback when `REG_RD_EN` is set
    RegisterReadback,
    /// `ADC_SEQ`: starts an ADC/temperature acquisition
    SequenceStart,
    /// `ADC_CONFIG`: reconfigures ADC inputs and rearms acquisition
    Reconfigure,
    /// `SW_RESET`: resets the device when carrying [`RESET_KEY`]
    SoftwareReset,
}

/// A control register or the DAC write layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDescriptor {
    pub name: &'static str,
    pub kind: RequestKind,
    pub fields: &'static [FieldDescriptor],
}

const REG_ADDR: FieldDescriptor = FieldDescriptor::formatted(11, 4, "REG_ADDR", Formatter::Hex);

const NOP_FIELDS: &[FieldDescriptor] = &[REG_ADDR];

const DAC_RD_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 3, "DAC_CH_SEL", Formatter::DacChannel),
    FieldDescriptor::formatted(3, 2, "DAC_RD_EN", Formatter::EnabledDisabled),
    FieldDescriptor::reserved(5, 6),
    REG_ADDR,
];

const ADC_SEQ_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 8, "ADC Channels", Formatter::BitIndices),
    // When enabled the temperature result is interleaved on MISO
    FieldDescriptor::formatted(8, 1, "Temp Indicator", Formatter::EnabledDisabled),
    FieldDescriptor::formatted(9, 1, "Repeat", Formatter::EnabledDisabled),
    FieldDescriptor::reserved(10, 1),
    REG_ADDR,
];

const GEN_CTRL_REG_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::reserved(0, 4),
    FieldDescriptor::formatted(4, 1, "DAC_RANGE", Formatter::VrefRange),
    FieldDescriptor::formatted(5, 1, "ADC_RANGE", Formatter::VrefRange),
    FieldDescriptor::formatted(6, 1, "ALL_DAC", Formatter::EnabledDisabled),
    FieldDescriptor::formatted(7, 1, "IO_LOCK", Formatter::EnabledDisabled),
    FieldDescriptor::formatted(8, 1, "ADC_BUF_EN", Formatter::EnabledDisabled),
    FieldDescriptor::formatted(9, 1, "ADC_BUF_PRECH", Formatter::EnabledDisabled),
    FieldDescriptor::reserved(10, 1),
    REG_ADDR,
];

const ADC_CONFIG_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 8, "ADC input pins", Formatter::BitIndices),
    FieldDescriptor::reserved(8, 3),
    REG_ADDR,
];

const DAC_CONFIG_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 8, "DAC output pins", Formatter::BitIndices),
    FieldDescriptor::reserved(8, 3),
    REG_ADDR,
];

const PULLDWN_CONFIG_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 8, "Weak-pulldown output pins", Formatter::BitIndices),
    FieldDescriptor::reserved(8, 3),
    REG_ADDR,
];

const CONFIG_READ_AND_LDAC_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 2, "LDAC_MODE", Formatter::Empty),
    FieldDescriptor::formatted(2, 4, "Read back register", Formatter::Hex),
    FieldDescriptor::formatted(6, 1, "REG_RD_EN", Formatter::EnabledDisabled),
    FieldDescriptor::reserved(7, 4),
    REG_ADDR,
];

const GPIO_CONFIG_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 8, "GPIO output pins", Formatter::BitIndices),
    FieldDescriptor::formatted(8, 1, "EN_BUSY", Formatter::EnabledDisabled),
    FieldDescriptor::reserved(9, 2),
    REG_ADDR,
];

const GPIO_OUTPUT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 8, "Logic \"1\" pins", Formatter::BitIndices),
    FieldDescriptor::reserved(8, 3),
    REG_ADDR,
];

const GPIO_INPUT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 8, "GPIO input pins", Formatter::BitIndices),
    FieldDescriptor::reserved(8, 2),
    FieldDescriptor::formatted(10, 1, "GPIO_RD_EN", Formatter::EnabledDisabled),
    REG_ADDR,
];

const PD_REF_CTRL_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 8, "DAC power-down pins", Formatter::BitIndices),
    FieldDescriptor::reserved(8, 1),
    FieldDescriptor::formatted(9, 1, "Internal reference", Formatter::EnabledDisabled),
    FieldDescriptor::formatted(10, 1, "Power down all", Formatter::EnabledDisabled),
    REG_ADDR,
];

const GPIO_OPENDRAIN_CONFIG_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 8, "GPIO open-drain pins", Formatter::BitIndices),
    FieldDescriptor::reserved(8, 3),
    REG_ADDR,
];

const IO_TS_CONFIG_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 8, "Three-state output pins", Formatter::BitIndices),
    FieldDescriptor::reserved(8, 3),
    REG_ADDR,
];

const SW_RESET_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::formatted(0, 11, "Reset command", Formatter::Hex),
    REG_ADDR,
];

const fn register(
    name: &'static str,
    kind: RequestKind,
    fields: &'static [FieldDescriptor],
) -> Option<RegisterDescriptor> {
    Some(RegisterDescriptor { name, kind, fields })
}

const fn plain(name: &'static str, fields: &'static [FieldDescriptor]) -> Option<RegisterDescriptor> {
    register(name, RequestKind::PlainWrite, fields)
}

/// Indexed by opcode
static CONTROL_REGISTERS: [Option<RegisterDescriptor>; 16] = [
    plain("NOP", NOP_FIELDS),
    register("DAC_RD", RequestKind::DacReadback, DAC_RD_FIELDS),
    register("ADC_SEQ", RequestKind::SequenceStart, ADC_SEQ_FIELDS),
    plain("GEN_CTRL_REG", GEN_CTRL_REG_FIELDS),
    register("ADC_CONFIG", RequestKind::Reconfigure, ADC_CONFIG_FIELDS),
    plain("DAC_CONFIG", DAC_CONFIG_FIELDS),
    plain("PULLDWN_CONFIG", PULLDWN_CONFIG_FIELDS),
    register(
        "CONFIG_READ_AND_LDAC",
        RequestKind::RegisterReadback,
        CONFIG_READ_AND_LDAC_FIELDS,
    ),
    plain("GPIO_CONFIG", GPIO_CONFIG_FIELDS),
    plain("GPIO_OUTPUT", GPIO_OUTPUT_FIELDS),
    plain("GPIO_INPUT", GPIO_INPUT_FIELDS),
    plain("PD_REF_CTRL", PD_REF_CTRL_FIELDS),
    plain("GPIO_OPENDRAIN_CONFIG", GPIO_OPENDRAIN_CONFIG_FIELDS),
    plain("IO_TS_CONFIG", IO_TS_CONFIG_FIELDS),
    // 0b1110 is unassigned
    None,
    register("SW_RESET", RequestKind::SoftwareReset, SW_RESET_FIELDS),
];

const DAC_WRITE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(0, 12, "DAC data"),
    FieldDescriptor::new(12, 3, "DAC addr"),
];

/// Layout shared by writes to any of the eight DAC channels
pub static DAC_WRITE: RegisterDescriptor = RegisterDescriptor {
    name: "DAC_WR",
    kind: RequestKind::PlainWrite,
    fields: DAC_WRITE_FIELDS,
};

/// Look up a control register by its 4-bit opcode
pub fn control_register(opcode: u8) -> Option<&'static RegisterDescriptor> {
    CONTROL_REGISTERS.get(usize::from(opcode))?.as_ref()
}

/// Look up the write layout of a DAC channel by its 3-bit address
pub fn dac_channel(address: u8) -> Option<&'static RegisterDescriptor> {
    (address < 8).then_some(&DAC_WRITE)
}

/// Interpretation applied to a MISO word, chosen by the protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnFormat {
    AdcResult,
    TmpSenseResult,
    DacDataRd,
    RegRead,
}

impl ReturnFormat {
    pub const ALL: [ReturnFormat; 4] = [
        ReturnFormat::AdcResult,
        ReturnFormat::TmpSenseResult,
        ReturnFormat::DacDataRd,
        ReturnFormat::RegRead,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ReturnFormat::AdcResult => "ADC_RESULT",
            ReturnFormat::TmpSenseResult => "TMP_SENSE_RESULT",
            ReturnFormat::DacDataRd => "DAC_DATA_RD",
            ReturnFormat::RegRead => "REG_READ",
        }
    }

    /// Field layout; empty for formats left undocumented
    pub fn fields(self) -> &'static [FieldDescriptor] {
        match self {
            ReturnFormat::AdcResult => ADC_RESULT_FIELDS,
            ReturnFormat::TmpSenseResult => TMP_SENSE_RESULT_FIELDS,
            ReturnFormat::DacDataRd => DAC_DATA_RD_FIELDS,
            ReturnFormat::RegRead => &[],
        }
    }
}

const ADC_RESULT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(0, 12, "ADC data"),
    FieldDescriptor::formatted(12, 3, "ADC_ADDR", Formatter::AdcChannel),
];

const TMP_SENSE_RESULT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(0, 12, "Temperature data"),
    FieldDescriptor::formatted(12, 4, "TEMPSENSE_ADDR", Formatter::Empty),
];

const DAC_DATA_RD_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(0, 12, "DAC data"),
    FieldDescriptor::new(12, 3, "DAC addr"),
];

/// Check that every descriptor list fits in 16 bits without overlap and
/// that every opcode is either described or deliberately absent.
pub fn validate() -> Result<()> {
    for opcode in 0..16u8 {
        match control_register(opcode) {
            Some(reg) => check_fields(reg.name, reg.fields)?,
            None if ABSENT_OPCODES.contains(&opcode) => {}
            None => return Err(DecodeError::MissingOpcode(opcode)),
        }
    }
    check_fields(DAC_WRITE.name, DAC_WRITE.fields)?;
    for format in ReturnFormat::ALL {
        check_fields(format.label(), format.fields())?;
    }
    Ok(())
}

/// Check one descriptor list
pub fn check_fields(register: &str, fields: &[FieldDescriptor]) -> Result<()> {
    let mut covered = 0u32;
    let mut owners: [Option<&'static str>; 16] = [None; 16];

    for field in fields {
        if field.width == 0 {
            return Err(DecodeError::EmptyField {
                register: register.to_string(),
                field: field.name.to_string(),
            });
        }
        if u32::from(field.offset) + u32::from(field.width) > 16 {
            return Err(DecodeError::FieldOutOfRange {
                register: register.to_string(),
                field: field.name.to_string(),
                offset: field.offset,
                width: field.width,
            });
        }

        let mask = field.mask();
        if covered & mask != 0 {
            let bit = (covered & mask).trailing_zeros() as usize;
            return Err(DecodeError::FieldOverlap {
                register: register.to_string(),
                first: owners[bit].unwrap_or("?").to_string(),
                second: field.name.to_string(),
            });
        }
        covered |= mask;
        for owner in owners
            .iter_mut()
            .skip(usize::from(field.offset))
            .take(usize::from(field.width))
        {
            *owner = Some(field.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_consistent() {
        validate().unwrap();
    }

    #[test]
    fn test_opcode_lookup() {
        assert_eq!(control_register(0b0010).unwrap().name, "ADC_SEQ");
        assert_eq!(control_register(0b0111).unwrap().kind, RequestKind::RegisterReadback);
        assert_eq!(control_register(0b1111).unwrap().name, "SW_RESET");
        assert!(control_register(0b1110).is_none());
        assert!(control_register(16).is_none());
    }

    #[test]
    fn test_request_kinds() {
        let kinds: Vec<_> = (0..16u8)
            .filter_map(control_register)
            .filter(|reg| reg.kind != RequestKind::PlainWrite)
            .map(|reg| (reg.name, reg.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("DAC_RD", RequestKind::DacReadback),
                ("ADC_SEQ", RequestKind::SequenceStart),
                ("ADC_CONFIG", RequestKind::Reconfigure),
                ("CONFIG_READ_AND_LDAC", RequestKind::RegisterReadback),
                ("SW_RESET", RequestKind::SoftwareReset),
            ]
        );
    }

    #[test]
    fn test_dac_channels_share_layout() {
        for address in 0..8 {
            let reg = dac_channel(address).unwrap();
            assert_eq!(reg.fields.len(), 2);
            assert_eq!(reg.fields[0].bits(), BitRange::new(0, 12));
            assert_eq!(reg.fields[1].bits(), BitRange::new(12, 3));
        }
        assert!(dac_channel(8).is_none());
    }

    #[test]
    fn test_formatters() {
        assert_eq!(Formatter::Decimal.apply(42), "42");
        assert_eq!(Formatter::Hex.apply(2), "0x02");
        assert_eq!(Formatter::Hex.apply(0x5AC), "0x5AC");
        assert_eq!(Formatter::EnabledDisabled.apply(0), "Disabled");
        assert_eq!(Formatter::EnabledDisabled.apply(3), "Enabled");
        assert_eq!(Formatter::DacChannel.apply(5), "DAC5");
        assert_eq!(Formatter::AdcChannel.apply(7), "ADC7");
        assert_eq!(Formatter::BitIndices.apply(0b1010_0101), "0,2,5,7");
        assert_eq!(Formatter::BitIndices.apply(0), "");
        assert_eq!(Formatter::VrefRange.apply(0), "0V to Vref");
        assert_eq!(Formatter::VrefRange.apply(1), "0V to 2xVref");
        assert_eq!(Formatter::Empty.apply(9), "");
    }

    #[test]
    fn test_check_fields_rejects_overlap() {
        let fields = [
            FieldDescriptor::new(0, 8, "low"),
            FieldDescriptor::new(7, 2, "straddle"),
        ];
        match check_fields("TEST", &fields) {
            Err(DecodeError::FieldOverlap { first, second, .. }) => {
                assert_eq!(first, "low");
                assert_eq!(second, "straddle");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_check_fields_rejects_out_of_range() {
        let fields = [FieldDescriptor::new(12, 5, "too wide")];
        assert!(matches!(
            check_fields("TEST", &fields),
            Err(DecodeError::FieldOutOfRange { offset: 12, width: 5, .. })
        ));
        let fields = [FieldDescriptor::new(3, 0, "nothing")];
        assert!(matches!(
            check_fields("TEST", &fields),
            Err(DecodeError::EmptyField { .. })
        ));
    }

    #[test]
    fn test_reserved_validator() {
        let field = FieldDescriptor::reserved(8, 3);
        let validator = field.validator.unwrap();
        assert!(validator.accepts(0));
        assert!(!validator.accepts(4));
        assert_eq!(field.mask(), 0x0700);
    }
}
