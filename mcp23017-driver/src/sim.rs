//! In-memory MCP23017 for host-side tests.
//!
//! [`SimulatedExpander`] implements [`embedded_hal::i2c::I2c`] on top of a
//! register file that follows the datasheet closely enough to exercise the
//! driver and the loops built on it:
//!
//! - sequential address-pointer auto-increment (`IOCON.SEQOP`),
//! - `IODIR` / `OLAT` / `GPIO` input/output semantics,
//! - interrupt capture on input changes, in change or compare-to-`DEFVAL`
//!   mode; `INTCAP` and `INTF` stay latched while a port's interrupt is
//!   pending,
//! - reading `INTCAPx` or `GPIOx` clears that port's pending interrupt.
//!
//! Clones share the same chip, so a test can keep a handle while the driver
//! owns another.

use std::sync::{Arc, Mutex, MutexGuard};
use std::vec::Vec;

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::driver::with_bit;
use crate::pin::{bit_for_pin, Port};
use crate::registers::*;

/// Error returned by the simulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError(pub ErrorKind);

impl i2c::Error for SimError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// One register-level access, as recorded in the access log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimAccess {
    Read(u8),
    Write(u8, u8),
}

struct Chip {
    registers: [u8; REGISTER_COUNT],
    pointer: u8,
    /// Externally driven pin levels.
    inputs: u16,
    intcap_reads: [usize; 2],
    transactions: usize,
    accesses: Vec<SimAccess>,
    fail_all: bool,
    fail_next: usize,
}

impl Chip {
    fn power_on() -> Self {
        let mut registers = [0u8; REGISTER_COUNT];
        registers[IODIRA as usize] = 0xFF;
        registers[IODIRB as usize] = 0xFF;
        Self {
            registers,
            pointer: 0,
            inputs: 0,
            intcap_reads: [0; 2],
            transactions: 0,
            accesses: Vec::new(),
            fail_all: false,
            fail_next: 0,
        }
    }

    fn reg(&self, register: u8) -> u8 {
        self.registers[register as usize]
    }

    fn input_byte(&self, port: Port) -> u8 {
        match port {
            Port::A => (self.inputs & 0xFF) as u8,
            Port::B => (self.inputs >> 8) as u8,
        }
    }

    /// Levels seen on a port: inputs for input pins, latches for outputs.
    fn port_levels(&self, port: Port) -> u8 {
        let iodir = self.reg(port.register(IODIRA, IODIRB));
        let olat = self.reg(port.register(OLATA, OLATB));
        (self.input_byte(port) & iodir) | (olat & !iodir)
    }

    fn clear_interrupt(&mut self, port: Port) {
        self.registers[port.register(INTFA, INTFB) as usize] = 0;
    }

    fn read(&mut self, register: u8) -> u8 {
        self.accesses.push(SimAccess::Read(register));
        match register {
            GPIOA | GPIOB => {
                let port = if register == GPIOA { Port::A } else { Port::B };
                self.clear_interrupt(port);
                self.port_levels(port)
            }
            INTCAPA | INTCAPB => {
                let port = if register == INTCAPA { Port::A } else { Port::B };
                self.intcap_reads[port as usize] += 1;
                self.clear_interrupt(port);
                self.reg(register)
            }
            _ => self.reg(register),
        }
    }

    fn write(&mut self, register: u8, value: u8) {
        self.accesses.push(SimAccess::Write(register, value));
        match register {
            IOCONA | IOCONB => {
                self.registers[IOCONA as usize] = value;
                self.registers[IOCONB as usize] = value;
            }
            GPIOA => self.registers[OLATA as usize] = value,
            GPIOB => self.registers[OLATB as usize] = value,
            INTFA | INTFB | INTCAPA | INTCAPB => {}
            _ => self.registers[register as usize] = value,
        }
    }

    fn advance(&mut self) {
        if self.reg(IOCONA) & (1 << IOCON_SEQOP) == 0 {
            self.pointer = (self.pointer + 1) % REGISTER_COUNT as u8;
        }
    }

    fn drive(&mut self, inputs: u16) {
        let before = [self.port_levels(Port::A), self.port_levels(Port::B)];
        self.inputs = inputs;

        for port in [Port::A, Port::B] {
            let now = self.port_levels(port);
            let enabled =
                self.reg(port.register(GPINTENA, GPINTENB)) & self.reg(port.register(IODIRA, IODIRB));
            let intcon = self.reg(port.register(INTCONA, INTCONB));
            let defval = self.reg(port.register(DEFVALA, DEFVALB));

            let changed = before[port as usize] ^ now;
            let on_change = changed & !intcon;
            let on_compare = changed & intcon & (now ^ defval);
            let triggered = (on_change | on_compare) & enabled;

            let intf = port.register(INTFA, INTFB) as usize;
            if triggered != 0 && self.registers[intf] == 0 {
                self.registers[intf] = triggered;
                self.registers[port.register(INTCAPA, INTCAPB) as usize] = now;
            }
        }
    }
}

/// Simulated MCP23017 answering at one 7-bit address.
#[derive(Clone)]
pub struct SimulatedExpander {
    address: u8,
    chip: Arc<Mutex<Chip>>,
}

impl SimulatedExpander {
    /// A chip in its power-on state: all pins inputs, everything else zero.
    pub fn new(address: u8) -> Self {
        Self {
            address,
            chip: Arc::new(Mutex::new(Chip::power_on())),
        }
    }

    fn chip(&self) -> MutexGuard<'_, Chip> {
        self.chip.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    // ── Pin stimulus ─────────────────────────────────────────────────

    /// Drive all 16 external pin levels at once, raising interrupts as the
    /// chip would.
    pub fn set_inputs(&self, inputs: u16) {
        self.chip().drive(inputs);
    }

    /// Drive one external pin level.
    pub fn set_pin(&self, pin: u8, high: bool) {
        let mut chip = self.chip();
        let inputs = chip.inputs;
        let port_bits = with_bit(
            match Port::of(pin) {
                Port::A => (inputs & 0xFF) as u8,
                Port::B => (inputs >> 8) as u8,
            },
            bit_for_pin(pin),
            high,
        ) as u16;
        let next = match Port::of(pin) {
            Port::A => (inputs & 0xFF00) | port_bits,
            Port::B => (inputs & 0x00FF) | (port_bits << 8),
        };
        chip.drive(next);
    }

    pub fn inputs(&self) -> u16 {
        self.chip().inputs
    }

    // ── Inspection ───────────────────────────────────────────────────

    /// Register contents, read without side effects.
    pub fn register(&self, register: u8) -> u8 {
        self.chip().reg(register)
    }

    /// Overwrite a register without side effects.
    pub fn poke(&self, register: u8, value: u8) {
        self.chip().registers[register as usize] = value;
    }

    pub fn interrupt_pending(&self, port: Port) -> bool {
        self.chip().reg(port.register(INTFA, INTFB)) != 0
    }

    /// Number of reads of a port's `INTCAP` register so far.
    pub fn intcap_reads(&self, port: Port) -> usize {
        self.chip().intcap_reads[port as usize]
    }

    /// Number of bus transactions addressed to any device so far.
    pub fn transactions(&self) -> usize {
        self.chip().transactions
    }

    /// Register accesses since the last [`clear_accesses`](Self::clear_accesses).
    pub fn accesses(&self) -> Vec<SimAccess> {
        self.chip().accesses.clone()
    }

    pub fn clear_accesses(&self) {
        self.chip().accesses.clear();
    }

    // ── Fault injection ──────────────────────────────────────────────

    /// Fail every transaction until switched off again.
    pub fn fail_transactions(&self, fail: bool) {
        self.chip().fail_all = fail;
    }

    /// Fail the next `count` transactions.
    pub fn fail_next(&self, count: usize) {
        self.chip().fail_next = count;
    }
}

impl ErrorType for SimulatedExpander {
    type Error = SimError;
}

impl I2c for SimulatedExpander {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let own_address = self.address;
        let mut chip = self.chip();
        chip.transactions += 1;

        if address != own_address {
            return Err(SimError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)));
        }
        if chip.fail_all {
            return Err(SimError(ErrorKind::Bus));
        }
        if chip.fail_next > 0 {
            chip.fail_next -= 1;
            return Err(SimError(ErrorKind::Bus));
        }

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((&register, data)) = bytes.split_first() {
                        chip.pointer = register % REGISTER_COUNT as u8;
                        for &value in data {
                            let register = chip.pointer;
                            chip.write(register, value);
                            chip.advance();
                        }
                    }
                }
                Operation::Read(buf) => {
                    for slot in buf.iter_mut() {
                        let register = chip.pointer;
                        *slot = chip.read(register);
                        chip.advance();
                    }
                }
            }
        }
        Ok(())
    }
}
