//! Register map of the CAP1293/CAP1296/CAP1298.
//!
//! Addresses and bit positions follow the Microchip datasheet (DS00001566).
//! Registers that carry several settings are described with [`Field`]s and
//! manipulated through [`extract_field`] / [`inject_field`].

/// Default 7-bit I2C address.
pub const DEFAULT_ADDRESS: u8 = 0x28;

/// Register addresses.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    MainControl = 0x00,
    GeneralStatus = 0x02,
    SensorInputStatus = 0x03,
    NoiseFlagStatus = 0x0A,
    SensorInput1DeltaCount = 0x10,
    SensorInput2DeltaCount = 0x11,
    SensorInput3DeltaCount = 0x12,
    SensorInput4DeltaCount = 0x13,
    SensorInput5DeltaCount = 0x14,
    SensorInput6DeltaCount = 0x15,
    SensorInput7DeltaCount = 0x16,
    SensorInput8DeltaCount = 0x17,
    SensitivityControl = 0x1F,
    Config = 0x20,
    SensorInputEnable = 0x21,
    SensorInputConfig = 0x22,
    SensorInputConfig2 = 0x23,
    AveragingAndSampleConfig = 0x24,
    CalibrationActivateAndStatus = 0x26,
    InterruptEnable = 0x27,
    RepeatRateEnable = 0x28,
    SignalGuardEnable = 0x29,
    MultipleTouchConfig = 0x2A,
    MultipleTouchPatternConfig = 0x2B,
    MultipleTouchPattern = 0x2D,
    BaseCountOutOfLimit = 0x2E,
    RecalibrationConfig = 0x2F,
    SensorInput1Threshold = 0x30,
    SensorInput2Threshold = 0x31,
    SensorInput3Threshold = 0x32,
    SensorInput4Threshold = 0x33,
    SensorInput5Threshold = 0x34,
    SensorInput6Threshold = 0x35,
    SensorInput7Threshold = 0x36,
    SensorInput8Threshold = 0x37,
    SensorInputNoiseThreshold = 0x38,
    StandbyChannel = 0x40,
    StandbyConfig = 0x41,
    StandbySensitivity = 0x42,
    StandbyThreshold = 0x43,
    Config2 = 0x44,
    SensorInput1BaseCount = 0x50,
    SensorInput2BaseCount = 0x51,
    SensorInput3BaseCount = 0x52,
    SensorInput4BaseCount = 0x53,
    SensorInput5BaseCount = 0x54,
    SensorInput6BaseCount = 0x55,
    SensorInput7BaseCount = 0x56,
    SensorInput8BaseCount = 0x57,
    PowerButton = 0x60,
    PowerButtonConfig = 0x61,
    CalibrationSensitivityConfig1 = 0x80,
    CalibrationSensitivityConfig2 = 0x81,
    SensorInput1Calibration = 0xB1,
    SensorInput2Calibration = 0xB2,
    SensorInput3Calibration = 0xB3,
    SensorInput4Calibration = 0xB4,
    SensorInput5Calibration = 0xB5,
    SensorInput6Calibration = 0xB6,
    SensorInput7Calibration = 0xB7,
    SensorInput8Calibration = 0xB8,
    SensorInputCalibrationLsb1 = 0xB9,
    SensorInputCalibrationLsb2 = 0xBA,
    ProductId = 0xFD,
    ManufacturerId = 0xFE,
    Revision = 0xFF,
}

impl From<Register> for u8 {
    fn from(reg: Register) -> Self {
        reg as u8
    }
}

/// A run of `width` bits starting at bit `offset` of `register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub register: Register,
    pub offset: u8,
    pub width: u8,
}

impl Field {
    pub const fn new(register: Register, offset: u8, width: u8) -> Self {
        Field {
            register,
            offset,
            width,
        }
    }

    /// Mask of the field's bits in register position.
    pub const fn mask(&self) -> u8 {
        (((1u16 << self.width) - 1) << self.offset) as u8
    }
}

/// Reads the value of `field` out of a register byte.
pub fn extract_field(byte: u8, field: Field) -> u8 {
    (byte & field.mask()) >> field.offset
}

/// Returns `byte` with `field` replaced by `value`. Bits of `value` wider
/// than the field are dropped; bits outside the field are kept.
pub fn inject_field(byte: u8, field: Field, value: u8) -> u8 {
    let mask = field.mask();
    (byte & !mask) | ((value << field.offset) & mask)
}

/// Bit positions of sensor inputs CS1..CS8 in every per-channel register.
const CHANNEL_BITS: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Mask for input `id` (1..=8) in a per-channel register.
pub fn channel_mask(id: u8) -> Option<u8> {
    let index = usize::from(id).checked_sub(1)?;
    CHANNEL_BITS.get(index).map(|bit| 1u8 << *bit)
}

/// Mask covering all eight inputs.
pub const ALL_CHANNELS: u8 = 0xFF;

pub mod sensitivity_control {
    //! Sensitivity Control register (0x1F)
    use super::{Field, Register::SensitivityControl};
    pub const BASE_SHIFT: Field = Field::new(SensitivityControl, 0, 4);
    pub const DELTA_SENSE: Field = Field::new(SensitivityControl, 4, 3);
}

pub mod general_status {
    //! General Status register (0x02)
    use super::{Field, Register::GeneralStatus};
    pub const TOUCH: Field = Field::new(GeneralStatus, 0, 1);
    pub const MTP: Field = Field::new(GeneralStatus, 1, 1);
    pub const MULT: Field = Field::new(GeneralStatus, 2, 1);
    pub const PWR: Field = Field::new(GeneralStatus, 4, 1);
    pub const ACAL_FAIL: Field = Field::new(GeneralStatus, 5, 1);
    pub const BC_OUT: Field = Field::new(GeneralStatus, 6, 1);
}

pub mod main_control {
    //! Main Control register (0x00)
    use super::{Field, Register::MainControl};
    pub const INT: Field = Field::new(MainControl, 0, 1);
    pub const COMBO: Field = Field::new(MainControl, 1, 1);
    pub const C_GAIN: Field = Field::new(MainControl, 2, 2);
    pub const DSLEEP: Field = Field::new(MainControl, 4, 1);
    pub const STBY: Field = Field::new(MainControl, 5, 1);
    pub const GAIN: Field = Field::new(MainControl, 6, 2);
}

pub mod config {
    //! Configuration register (0x20)
    use super::{Field, Register::Config};
    pub const MAX_DUR_EN: Field = Field::new(Config, 3, 1);
    pub const DIS_ANA_NOISE: Field = Field::new(Config, 4, 1);
    pub const DIS_DIG_NOISE: Field = Field::new(Config, 5, 1);
    pub const TIMEOUT: Field = Field::new(Config, 7, 1);
}

pub mod config_2 {
    //! Configuration 2 register (0x44)
    use super::{Field, Register::Config2};
    /// Active low: 0 raises an interrupt on press and release.
    pub const INT_REL_N: Field = Field::new(Config2, 0, 1);
    pub const ACAL_FAIL_INT: Field = Field::new(Config2, 1, 1);
    /// Active high disable of the RF noise filter.
    pub const DIS_RF_NOISE: Field = Field::new(Config2, 2, 1);
    pub const SHOW_RF_NOISE: Field = Field::new(Config2, 3, 1);
    pub const BC_OUT_INT: Field = Field::new(Config2, 4, 1);
    pub const BLK_PWR_CTRL: Field = Field::new(Config2, 5, 1);
    pub const BC_OUT_RECAL: Field = Field::new(Config2, 6, 1);
}

pub mod sensor_input_config {
    //! Sensor Input Configuration register (0x22)
    use super::{Field, Register::SensorInputConfig};
    pub const RPT_RATE: Field = Field::new(SensorInputConfig, 0, 4);
    pub const MAX_DUR: Field = Field::new(SensorInputConfig, 4, 4);
}

pub mod multiple_touch_config {
    //! Multiple Touch Configuration register (0x2A)
    use super::{Field, Register::MultipleTouchConfig};
    pub const B_MULT_T: Field = Field::new(MultipleTouchConfig, 2, 2);
    pub const MULT_BLK_EN: Field = Field::new(MultipleTouchConfig, 7, 1);
}

pub mod multiple_touch_pattern_config {
    //! Multiple Touch Pattern Configuration register (0x2B)
    use super::{Field, Register::MultipleTouchPatternConfig};
    pub const MTP_ALERT: Field = Field::new(MultipleTouchPatternConfig, 0, 1);
    pub const COMP_PTRN: Field = Field::new(MultipleTouchPatternConfig, 1, 1);
    pub const MTP_TH: Field = Field::new(MultipleTouchPatternConfig, 2, 2);
    pub const MTP_EN: Field = Field::new(MultipleTouchPatternConfig, 7, 1);
}

/// Supported chip variants, identified by their Product ID register.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    Cap1293 = 0x6F,
    Cap1296 = 0x69,
    Cap1298 = 0x71,
}

impl Model {
    pub fn product_id(self) -> u8 {
        self as u8
    }

    /// Number of sensor inputs bonded out on this variant.
    pub fn inputs(self) -> u8 {
        match self {
            Model::Cap1293 => 3,
            Model::Cap1296 => 6,
            Model::Cap1298 => 8,
        }
    }
}

/// Touch sensitivity multiplier, stored as the DELTA_SENSE code.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensitivity {
    /// Most sensitive
    X128 = 0x00,
    X64 = 0x01,
    X32 = 0x02,
    X16 = 0x03,
    X8 = 0x04,
    X4 = 0x05,
    X2 = 0x06,
    /// Least sensitive
    X1 = 0x07,
}

impl Sensitivity {
    /// Decodes a DELTA_SENSE field value.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0x00 => Some(Sensitivity::X128),
            0x01 => Some(Sensitivity::X64),
            0x02 => Some(Sensitivity::X32),
            0x03 => Some(Sensitivity::X16),
            0x04 => Some(Sensitivity::X8),
            0x05 => Some(Sensitivity::X4),
            0x06 => Some(Sensitivity::X2),
            0x07 => Some(Sensitivity::X1),
            _ => None,
        }
    }

    pub fn multiplier(self) -> u8 {
        128 >> (self as u8)
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Sensitivity::X32
    }
}

/// Unknown codes select the 32x default.
impl From<u8> for Sensitivity {
    fn from(value: u8) -> Self {
        Sensitivity::from_bits(value).unwrap_or_default()
    }
}

/// Time a touch may be held before the input recalibrates.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxHoldDuration {
    Ms560 = 0x00,
    Ms840 = 0x01,
    Ms1120 = 0x02,
    Ms1400 = 0x03,
    Ms1680 = 0x04,
    Ms2240 = 0x05,
    Ms2800 = 0x06,
    Ms3360 = 0x07,
    Ms3920 = 0x08,
    Ms4480 = 0x09,
    Ms5600 = 0x0A,
    Ms6720 = 0x0B,
    Ms7840 = 0x0C,
    Ms8960 = 0x0D,
    Ms10080 = 0x0E,
    Ms11200 = 0x0F,
}

impl MaxHoldDuration {
    pub fn from_bits(bits: u8) -> Option<Self> {
        use MaxHoldDuration::*;
        const ALL: [MaxHoldDuration; 16] = [
            Ms560, Ms840, Ms1120, Ms1400, Ms1680, Ms2240, Ms2800, Ms3360, Ms3920, Ms4480, Ms5600,
            Ms6720, Ms7840, Ms8960, Ms10080, Ms11200,
        ];
        ALL.get(usize::from(bits)).copied()
    }

    pub fn millis(self) -> u16 {
        const MILLIS: [u16; 16] = [
            560, 840, 1120, 1400, 1680, 2240, 2800, 3360, 3920, 4480, 5600, 6720, 7840, 8960,
            10080, 11200,
        ];
        MILLIS[self as usize]
    }
}

impl Default for MaxHoldDuration {
    fn default() -> Self {
        MaxHoldDuration::Ms5600
    }
}

/// Unknown codes select the 5600 ms default.
impl From<u8> for MaxHoldDuration {
    fn from(value: u8) -> Self {
        MaxHoldDuration::from_bits(value).unwrap_or_default()
    }
}

/// How the Multiple Touch Pattern register is compared against touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternMode {
    /// Exactly the inputs flagged in the pattern register.
    Specific,
    /// At least as many inputs as are flagged in the pattern register.
    MinimalTouches,
}

impl PatternMode {
    pub(crate) fn comp_ptrn(self) -> u8 {
        match self {
            PatternMode::Specific => 1,
            PatternMode::MinimalTouches => 0,
        }
    }
}

/// MTP_TH: share of the touch threshold that counts towards a pattern.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternThreshold {
    Percent12_5 = 0x00,
    Percent25 = 0x01,
    Percent37_5 = 0x02,
    Percent100 = 0x03,
}
