use cap129n::{Bus, BusError, Cap129n, Config, Error, HalBus, Model, Register};
use embedded_hal::blocking::i2c::{Write, WriteRead};

#[derive(Debug)]
struct Nak;

/// Minimal I2C slave at 0x28 with an auto-incrementing register pointer.
struct FakeI2c {
    regs: [u8; 256],
    frames: Vec<Vec<u8>>,
}

impl FakeI2c {
    fn new() -> Self {
        let mut regs = [0u8; 256];
        regs[Register::ProductId as usize] = Model::Cap1298.product_id();
        regs[Register::SensorInputEnable as usize] = 0xFF;
        FakeI2c {
            regs,
            frames: Vec::new(),
        }
    }
}

impl Write for FakeI2c {
    type Error = Nak;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Nak> {
        if address != 0x28 {
            return Err(Nak);
        }
        self.frames.push(bytes.to_vec());
        if let Some((&register, values)) = bytes.split_first() {
            for (offset, &value) in values.iter().enumerate() {
                self.regs[usize::from(register) + offset] = value;
            }
        }
        Ok(())
    }
}

impl WriteRead for FakeI2c {
    type Error = Nak;

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Nak> {
        if address != 0x28 {
            return Err(Nak);
        }
        let start = usize::from(bytes[0]);
        buffer.copy_from_slice(&self.regs[start..start + buffer.len()]);
        Ok(())
    }
}

#[test]
fn drives_an_embedded_hal_bus() {
    let _ = env_logger::builder().is_test(true).try_init();
    let bus = HalBus::new(FakeI2c::new());
    let mut touch = Cap129n::init(bus, Model::Cap1298, &Config::default()).unwrap();
    touch.enable_signal_guard().unwrap();
    assert!(!touch.is_sensing_enabled(2).unwrap());

    let i2c = touch.release().into_inner();
    assert_eq!(i2c.regs[Register::InterruptEnable as usize], 0xFF);
    assert_eq!(i2c.regs[Register::SignalGuardEnable as usize], 0xFF);
    assert_eq!(i2c.frames[0], Vec::<u8>::new());
    assert!(i2c.frames.contains(&vec![Register::SensorInputEnable as u8, 0xFD]));
}

#[test]
fn burst_access_auto_increments() {
    let mut bus = HalBus::new(FakeI2c::new());
    bus.write_bytes(0x28, Register::SensorInput1Threshold as u8, &[1, 2, 3])
        .unwrap();
    let mut buf = [0u8; 3];
    bus.read_bytes(0x28, Register::SensorInput1Threshold as u8, &mut buf)
        .unwrap();
    assert_eq!(buf, [1, 2, 3]);
    assert_eq!(bus.read_byte(0x28, Register::SensorInput3Threshold as u8).unwrap(), 3);
}

#[test]
fn hal_errors_are_reported() {
    let mut bus = HalBus::new(FakeI2c::new());
    match bus.read_byte(0x30, 0x00) {
        Err(BusError::Hal(msg)) => assert_eq!(msg, "Nak"),
        other => panic!("unexpected result: {:?}", other),
    }

    let result = Cap129n::with_address(bus, Model::Cap1298, 0x30).begin(&Config::default());
    assert!(matches!(result, Err(Error::NoDeviceAtAddress(0x30))));
}
