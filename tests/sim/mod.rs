//! In-memory CAP129n register file for driving the driver without hardware.
#![allow(dead_code)]

use cap129n::{Bus, BusError, Model, Register, DEFAULT_ADDRESS};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct SimBus {
    pub regs: [u8; 256],
    pub address: u8,
    /// Pings to NAK before the first ACK.
    pub nacks: usize,
    pub pings: usize,
    /// Every register write, in order.
    pub writes: Vec<(u8, u8)>,
    pub reads: Vec<u8>,
    /// Register whose reads fail.
    pub broken: Option<u8>,
}

impl SimBus {
    pub fn new(model: Model) -> Self {
        let mut regs = [0u8; 256];
        regs[Register::ProductId as usize] = model.product_id();
        regs[Register::ManufacturerId as usize] = 0x5D;
        // Power-on defaults
        regs[Register::SensitivityControl as usize] = 0x2F;
        regs[Register::Config as usize] = 0x20;
        regs[Register::SensorInputEnable as usize] = 0xFF;
        regs[Register::SensorInputConfig as usize] = 0xA4;
        regs[Register::InterruptEnable as usize] = 0xFF;
        regs[Register::RepeatRateEnable as usize] = 0xFF;
        regs[Register::MultipleTouchConfig as usize] = 0x80;
        regs[Register::MultipleTouchPatternConfig as usize] = 0x00;
        regs[Register::MultipleTouchPattern as usize] = 0xFF;
        regs[Register::Config2 as usize] = 0x40;
        SimBus {
            regs,
            address: DEFAULT_ADDRESS,
            nacks: 0,
            pings: 0,
            writes: Vec::new(),
            reads: Vec::new(),
            broken: None,
        }
    }

    pub fn reg(&self, register: Register) -> u8 {
        self.regs[register as usize]
    }

    pub fn set(&mut self, register: Register, value: u8) {
        self.regs[register as usize] = value;
    }

    /// Latches a touch on input `id` the way the chip does.
    pub fn touch(&mut self, id: u8) {
        self.regs[Register::SensorInputStatus as usize] |= 1 << (id - 1);
        self.regs[Register::GeneralStatus as usize] |= 0x01;
        self.regs[Register::MainControl as usize] |= 0x01;
    }

    pub fn writes_to(&self, register: Register) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(reg, _)| *reg == register as u8)
            .map(|(_, value)| *value)
            .collect()
    }

    fn check(&self, address: u8) -> Result<(), BusError> {
        if address == self.address {
            Ok(())
        } else {
            Err(BusError::Nack { address })
        }
    }
}

impl Bus for SimBus {
    fn ping(&mut self, address: u8) -> Result<(), BusError> {
        self.pings += 1;
        self.check(address)?;
        if self.pings <= self.nacks {
            return Err(BusError::Nack { address });
        }
        Ok(())
    }

    fn read_bytes(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.check(address)?;
        if self.broken == Some(register) {
            return Err(BusError::ShortRead {
                register,
                expected: buf.len(),
                got: 0,
            });
        }
        for (offset, byte) in buf.iter_mut().enumerate() {
            let reg = register.wrapping_add(offset as u8);
            self.reads.push(reg);
            *byte = self.regs[reg as usize];
        }
        Ok(())
    }

    fn write_bytes(&mut self, address: u8, register: u8, values: &[u8]) -> Result<(), BusError> {
        self.check(address)?;
        for (offset, &value) in values.iter().enumerate() {
            let reg = register.wrapping_add(offset as u8);
            self.writes.push((reg, value));
            self.regs[reg as usize] = value;
            // Clearing INT releases the latched status bits.
            if reg == Register::MainControl as u8 && value & 0x01 == 0 {
                self.regs[Register::GeneralStatus as usize] &= !0x03;
                self.regs[Register::SensorInputStatus as usize] = 0;
            }
        }
        Ok(())
    }
}
