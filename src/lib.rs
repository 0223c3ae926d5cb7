//! Driver for the Microchip CAP1293, CAP1296 and CAP1298 capacitive touch sensors.
//!
//! Every setting of the chip lives in an 8-bit register, often several to a
//! register. The driver reads the register, changes only the bits it was
//! asked to change and writes the byte back, so unrelated settings survive.
//!
//! The chip talks I2C/SMBus. On Linux the [`rppal`] I2C device is supported out
//! of the box; any other `embedded-hal` blocking I2C implementation can be
//! wrapped in [`bus::HalBus`].
//!
//! ## Example
//!
//! ```rust, ignore
//! pub fn main() {
//!     use cap129n::{Cap129n, Config, Model, Sensitivity};
//!
//!     let config = Config {
//!         sensitivity: Sensitivity::X64,
//!         ..Config::default()
//!     };
//!     let mut touch = Cap129n::open(Model::Cap1298, &config).unwrap();
//!
//!     loop {
//!         for pad in 1..=8 {
//!             if touch.is_channel_touched(pad).unwrap() {
//!                 println!("Pad {} touched", pad);
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! ## Concurrency
//!
//! Updates are a read followed by a write, two separate bus transactions.
//! Share a handle between threads only behind a `Mutex`.
//!
//! ## Debugging
//!
//! Every register access is logged with `debug!`. Attaching a logger and
//! setting `RUST_LOG=debug` will show the traffic.
//!
#[macro_use]
extern crate log;
use rppal::i2c::I2c;
use thiserror::Error;

pub mod bus;
pub mod regs;

pub use bus::{Bus, BusError, HalBus};
use regs::{
    channel_mask, config, config_2, extract_field, general_status, inject_field, main_control,
    multiple_touch_config, multiple_touch_pattern_config, sensitivity_control,
    sensor_input_config, Field, ALL_CHANNELS,
};
pub use regs::{
    MaxHoldDuration, Model, PatternMode, PatternThreshold, Register, Sensitivity, DEFAULT_ADDRESS,
};

/// Channel used as the guard electrode while signal guard is active.
const SIGNAL_GUARD_CHANNEL: u8 = 2;

pub type Result<T> = std::result::Result<T, Error>;

/// Settings applied by [`Cap129n::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub sensitivity: Sensitivity,
    /// Enables the interrupt for all eight inputs.
    pub interrupts: bool,
    /// Turns input 2 into a signal guard for the others.
    pub signal_guard: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sensitivity: Sensitivity::X32,
            interrupts: true,
            signal_guard: false,
        }
    }
}

pub struct Cap129n<B: Bus> {
    bus: B,
    address: u8,
    model: Model,
    signal_guard_enabled: bool,
}

impl Cap129n<I2c> {
    /// Opens the default Linux I2C bus and initializes a sensor at
    /// [`DEFAULT_ADDRESS`].
    pub fn open(model: Model, config: &Config) -> Result<Self> {
        let i2c = I2c::new().map_err(BusError::from)?;
        Cap129n::init(i2c, model, config)
    }
}

impl<B: Bus> Cap129n<B> {
    /// Creates a handle for a sensor at [`DEFAULT_ADDRESS`]. Nothing is sent
    /// on the bus until [`begin`](Self::begin).
    pub fn new(bus: B, model: Model) -> Self {
        Cap129n::with_address(bus, model, DEFAULT_ADDRESS)
    }

    pub fn with_address(bus: B, model: Model, address: u8) -> Self {
        Cap129n {
            bus,
            address,
            model,
            signal_guard_enabled: false,
        }
    }

    /// Creates a handle and runs [`begin`](Self::begin) on it.
    pub fn init(bus: B, model: Model, config: &Config) -> Result<Self> {
        let mut sensor = Cap129n::new(bus, model);
        sensor.begin(config)?;
        Ok(sensor)
    }

    /// Checks that the expected chip answers and applies `config`.
    ///
    /// Nothing is written if the device does not answer or reports another
    /// product id. Calling it again re-applies the same configuration.
    pub fn begin(&mut self, config: &Config) -> Result<()> {
        if !self.is_connected() {
            debug!("No device at {:#04X}", self.address);
            return Err(Error::NoDeviceAtAddress(self.address));
        }

        let found = self.read_register(Register::ProductId)?;
        let expected = self.model.product_id();
        if found != expected {
            return Err(Error::WrongProductId { expected, found });
        }
        debug!(
            "Found {:?} ({} inputs) at {:#04X}",
            self.model,
            self.model.inputs(),
            self.address
        );

        self.set_sensitivity(config.sensitivity)?;

        // Input 2 is the guard electrode and stops sensing.
        if config.signal_guard {
            self.enable_signal_guard()?;
        } else {
            self.disable_signal_guard()?;
        }

        if config.interrupts {
            self.set_interrupt_enabled()?;
        } else {
            self.set_interrupt_disabled()?;
        }

        self.clear_interrupt()
    }

    /// True if the device acknowledges its address within
    /// [`bus::PROBE_ATTEMPTS`] tries.
    pub fn is_connected(&mut self) -> bool {
        self.bus.probe(self.address)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Last signal guard state set through this handle.
    pub fn signal_guard_enabled(&self) -> bool {
        self.signal_guard_enabled
    }

    /// Gives the bus back.
    pub fn release(self) -> B {
        self.bus
    }

    // ---- Sensitivity ----

    /// Sets the touch sensitivity. Raw `u8` codes that are not a valid
    /// DELTA_SENSE value select 32x.
    pub fn set_sensitivity<S: Into<Sensitivity>>(&mut self, sensitivity: S) -> Result<()> {
        let sensitivity = sensitivity.into();
        self.write_field(sensitivity_control::DELTA_SENSE, sensitivity as u8)
    }

    /// Current sensitivity multiplier (1 to 128), or 0 if the stored value
    /// cannot be decoded.
    pub fn get_sensitivity(&mut self) -> Result<u8> {
        let bits = self.read_field(sensitivity_control::DELTA_SENSE)?;
        Ok(Sensitivity::from_bits(bits).map_or(0, Sensitivity::multiplier))
    }

    // ---- Touch status ----

    /// True if any input is touched. Clears the interrupt when it is.
    pub fn is_touched(&mut self) -> Result<bool> {
        let touched = self.read_field(general_status::TOUCH)? == 1;
        if touched {
            self.clear_interrupt()?;
        }
        Ok(touched)
    }

    /// True if input `id` (1..=8) is touched. Clears the interrupt when it
    /// is. Unknown inputs are never touched.
    pub fn is_channel_touched(&mut self, id: u8) -> Result<bool> {
        let mask = match channel_mask(id) {
            Some(mask) => mask,
            None => return Ok(false),
        };
        let touched = self.read_register(Register::SensorInputStatus)? & mask != 0;
        if touched {
            self.clear_interrupt()?;
        }
        Ok(touched)
    }

    /// True if the multiple touch pattern was detected. Clears the
    /// interrupt when it was.
    pub fn is_pattern_touched(&mut self) -> Result<bool> {
        let detected = self.read_field(general_status::MTP)? == 1;
        if detected {
            self.clear_interrupt()?;
        }
        Ok(detected)
    }

    // ---- Sensor inputs ----

    /// Inputs outside 1..=8 are ignored.
    pub fn enable_sensing(&mut self, id: u8) -> Result<()> {
        self.set_channel(Register::SensorInputEnable, id, true)
    }

    /// Inputs outside 1..=8 are ignored.
    pub fn disable_sensing(&mut self, id: u8) -> Result<()> {
        self.set_channel(Register::SensorInputEnable, id, false)
    }

    pub fn is_sensing_enabled(&mut self, id: u8) -> Result<bool> {
        match channel_mask(id) {
            Some(mask) => Ok(self.read_register(Register::SensorInputEnable)? & mask != 0),
            None => Ok(false),
        }
    }

    // ---- Signal guard ----

    /// Turns off sensing on input 2 and enables the guard for all inputs.
    pub fn enable_signal_guard(&mut self) -> Result<()> {
        self.disable_sensing(SIGNAL_GUARD_CHANNEL)?;
        self.update_bits(Register::SignalGuardEnable, ALL_CHANNELS, true)?;
        self.signal_guard_enabled = true;
        Ok(())
    }

    /// Disables the guard for all inputs. Sensing on input 2 stays off
    /// until re-enabled with [`enable_sensing`](Self::enable_sensing).
    pub fn disable_signal_guard(&mut self) -> Result<()> {
        self.update_bits(Register::SignalGuardEnable, ALL_CHANNELS, false)?;
        self.signal_guard_enabled = false;
        Ok(())
    }

    // ---- Interrupts ----

    pub fn set_interrupt_enabled(&mut self) -> Result<()> {
        self.update_bits(Register::InterruptEnable, ALL_CHANNELS, true)
    }

    pub fn set_interrupt_disabled(&mut self) -> Result<()> {
        self.update_bits(Register::InterruptEnable, ALL_CHANNELS, false)
    }

    /// Clears the INT latch in Main Control.
    pub fn clear_interrupt(&mut self) -> Result<()> {
        self.write_field(main_control::INT, 0)
    }

    // ---- Multiple touch ----

    pub fn enable_multiple_touch_limit(&mut self) -> Result<()> {
        self.write_field(multiple_touch_config::MULT_BLK_EN, 1)
    }

    pub fn disable_multiple_touch_limit(&mut self) -> Result<()> {
        self.write_field(multiple_touch_config::MULT_BLK_EN, 0)
    }

    /// Enables multiple touch blocking above `touches` simultaneous inputs.
    /// Only 1 to 4 can be encoded; other values keep the previous limit.
    pub fn set_multiple_touch_limit(&mut self, touches: u8) -> Result<()> {
        let mut value = self.read_register(Register::MultipleTouchConfig)?;
        value = inject_field(value, multiple_touch_config::MULT_BLK_EN, 1);
        if (1..=4).contains(&touches) {
            value = inject_field(value, multiple_touch_config::B_MULT_T, touches - 1);
        } else {
            warn!("Multiple touch limit {} not encodable, keeping previous", touches);
        }
        self.write_register(Register::MultipleTouchConfig, value)
    }

    // ---- Multiple touch pattern ----

    pub fn enable_pattern_detection(&mut self) -> Result<()> {
        self.write_field(multiple_touch_pattern_config::MTP_EN, 1)
    }

    pub fn disable_pattern_detection(&mut self) -> Result<()> {
        self.write_field(multiple_touch_pattern_config::MTP_EN, 0)
    }

    pub fn set_pattern_mode(&mut self, mode: PatternMode) -> Result<()> {
        self.write_field(multiple_touch_pattern_config::COMP_PTRN, mode.comp_ptrn())
    }

    /// `buttons[0]` is input 1.
    pub fn set_pattern_specific_buttons(&mut self, buttons: [bool; 8]) -> Result<()> {
        let mut value = self.read_register(Register::MultipleTouchPattern)?;
        for (index, &member) in buttons.iter().enumerate() {
            let mask = 1u8 << index;
            if member {
                value |= mask;
            } else {
                value &= !mask;
            }
        }
        self.write_register(Register::MultipleTouchPattern, value)
    }

    /// Flags inputs 1..=`buttons` in the pattern register and clears the rest.
    pub fn set_pattern_minimal_buttons(&mut self, buttons: u8) -> Result<()> {
        let mut pattern = [false; 8];
        for (index, member) in pattern.iter_mut().enumerate() {
            *member = usize::from(buttons) > index;
        }
        self.set_pattern_specific_buttons(pattern)
    }

    pub fn set_pattern_threshold(&mut self, threshold: PatternThreshold) -> Result<()> {
        self.write_field(multiple_touch_pattern_config::MTP_TH, threshold as u8)
    }

    pub fn enable_pattern_interrupt(&mut self) -> Result<()> {
        self.write_field(multiple_touch_pattern_config::MTP_ALERT, 1)
    }

    pub fn disable_pattern_interrupt(&mut self) -> Result<()> {
        self.write_field(multiple_touch_pattern_config::MTP_ALERT, 0)
    }

    // ---- Calibration ----

    /// Starts calibration of input `id`. The chip clears the bit when done.
    pub fn calibrate_channel(&mut self, id: u8) -> Result<()> {
        self.set_channel(Register::CalibrationActivateAndStatus, id, true)
    }

    pub fn calibrate_all(&mut self) -> Result<()> {
        self.update_bits(Register::CalibrationActivateAndStatus, ALL_CHANNELS, true)
    }

    // ---- Configuration ----

    pub fn enable_smbus_timeout(&mut self) -> Result<()> {
        self.write_field(config::TIMEOUT, 1)
    }

    pub fn disable_smbus_timeout(&mut self) -> Result<()> {
        self.write_field(config::TIMEOUT, 0)
    }

    /// Sets how long a touch may be held before recalibration and enables
    /// the limit. Raw `u8` codes outside 0..=15 select 5600 ms.
    pub fn set_maximum_hold_duration<D: Into<MaxHoldDuration>>(&mut self, duration: D) -> Result<()> {
        let duration = duration.into();
        debug!("Maximum hold duration {} ms", duration.millis());
        self.write_field(sensor_input_config::MAX_DUR, duration as u8)?;
        self.enable_maximum_hold_duration()
    }

    pub fn enable_maximum_hold_duration(&mut self) -> Result<()> {
        self.write_field(config::MAX_DUR_EN, 1)
    }

    pub fn disable_maximum_hold_duration(&mut self) -> Result<()> {
        self.write_field(config::MAX_DUR_EN, 0)
    }

    // DIS_RF_NOISE is a disable bit.
    pub fn enable_rf_noise_filter(&mut self) -> Result<()> {
        self.write_field(config_2::DIS_RF_NOISE, 0)
    }

    pub fn disable_rf_noise_filter(&mut self) -> Result<()> {
        self.write_field(config_2::DIS_RF_NOISE, 1)
    }

    // INT_REL_n is active low.
    pub fn enable_interrupt_on_release(&mut self) -> Result<()> {
        self.write_field(config_2::INT_REL_N, 0)
    }

    pub fn disable_interrupt_on_release(&mut self) -> Result<()> {
        self.write_field(config_2::INT_REL_N, 1)
    }

    pub fn enable_interrupt_repeat_rate(&mut self) -> Result<()> {
        self.update_bits(Register::RepeatRateEnable, ALL_CHANNELS, true)
    }

    pub fn disable_interrupt_repeat_rate(&mut self) -> Result<()> {
        self.update_bits(Register::RepeatRateEnable, ALL_CHANNELS, false)
    }

    // ---- Raw access ----

    /// Sensor Input Status byte, one bit per input. Clears the interrupt.
    pub fn input_status(&mut self) -> Result<u8> {
        let status = self.read_register(Register::SensorInputStatus)?;
        self.clear_interrupt()?;
        Ok(status)
    }

    pub fn general_status(&mut self) -> Result<u8> {
        self.read_register(Register::GeneralStatus)
    }

    pub fn main_control(&mut self) -> Result<u8> {
        self.read_register(Register::MainControl)
    }

    pub fn read_register(&mut self, register: Register) -> Result<u8> {
        let value = self.bus.read_byte(self.address, register.into())?;
        debug!("Read {:?} = {:#010b}", register, value);
        Ok(value)
    }

    pub fn write_register(&mut self, register: Register, value: u8) -> Result<()> {
        debug!("Write {:?} = {:#010b}", register, value);
        self.bus.write_byte(self.address, register.into(), value)?;
        Ok(())
    }

    fn read_field(&mut self, field: Field) -> Result<u8> {
        let value = self.read_register(field.register)?;
        Ok(extract_field(value, field))
    }

    fn write_field(&mut self, field: Field, value: u8) -> Result<()> {
        let current = self.read_register(field.register)?;
        self.write_register(field.register, inject_field(current, field, value))
    }

    /// Sets or clears `mask` in `register`, leaving other bits alone.
    fn update_bits(&mut self, register: Register, mask: u8, set: bool) -> Result<()> {
        let current = self.read_register(register)?;
        let value = if set { current | mask } else { current & !mask };
        self.write_register(register, value)
    }

    fn set_channel(&mut self, register: Register, id: u8, set: bool) -> Result<()> {
        match channel_mask(id) {
            Some(mask) => self.update_bits(register, mask, set),
            None => {
                warn!("Ignoring input {} for {:?}, valid inputs are 1-8", id, register);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("No device acknowledged at address {0:#04X}")]
    NoDeviceAtAddress(u8),
    #[error("Invalid product ID. Expected {expected:#04X}, got {found:#04X}")]
    WrongProductId { expected: u8, found: u8 },
    #[error("Bus error. {source}")]
    Bus {
        #[from]
        source: BusError,
    },
}
