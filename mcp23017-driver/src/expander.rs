//! High-level interface for the MCP23017 16-bit GPIO expander.
//!
//! [`Mcp23017`] wraps the crate-private register driver with pin
//! validation, port selection and the interrupt-capture reads the encoder
//! poll loop is built on.

use embedded_hal::i2c::{ErrorKind, I2c};

use crate::driver::{with_bit, RegisterBus};
use crate::error::ExpanderError;
use crate::pin::{
    bit_for_pin, is_valid_pin, register_for_pin, Direction, InterruptMode, Level, PinConfig, Port,
};
use crate::registers::*;

/// One MCP23017 on an I2C bus.
///
/// The driver exclusively owns its bus handle. Every fallible method
/// returns a typed error instead of a sentinel value, and the kind of the
/// most recent bus failure stays available through
/// [`last_error`](Self::last_error).
///
/// # Example
///
/// ```ignore
/// use mcp23017_driver::{Mcp23017, PinConfig};
///
/// // `i2c` is any `embedded-hal` 1.0 I2C implementation
/// let mut mcp = Mcp23017::new(i2c, 0x21);
/// mcp.init()?;
/// for pin in 0..16 {
///     mcp.configure_pin(pin, PinConfig::encoder_input())?;
/// }
///
/// // Levels latched at the last interrupt; clears both ports' interrupts.
/// let snapshot = mcp.read_interrupt_capture_both()?;
/// ```
pub struct Mcp23017<I2C> {
    bus: RegisterBus<I2C>,
}

impl<I2C> Mcp23017<I2C>
where
    I2C: I2c,
{
    /// Create a driver. No bus traffic is generated.
    ///
    /// # Arguments
    /// * `i2c`: I2C handle (takes ownership for exclusive access)
    /// * `address`: 7-bit device address (`0x20..=0x27`)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            bus: RegisterBus::new(i2c, address),
        }
    }

    /// Put the chip into its known starting state.
    ///
    /// Both ports become inputs except pin 0 of each port, which is left
    /// as an output. A failure here means the chip is not usable.
    pub fn init(&mut self) -> Result<(), ExpanderError<I2C::Error>> {
        self.bus.write_register(IODIRA, INIT_IODIR)?;
        self.bus.write_register(IODIRB, INIT_IODIR)?;
        Ok(())
    }

    pub fn address(&self) -> u8 {
        self.bus.address()
    }

    /// Kind of the most recent failed bus transaction, if any.
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.bus.last_error()
    }

    /// Give the bus handle back.
    pub fn release(self) -> I2C {
        self.bus.release()
    }

    // -----------------------------------------------------------------------
    // Raw register access
    // -----------------------------------------------------------------------

    pub fn read_register(&mut self, register: u8) -> Result<u8, ExpanderError<I2C::Error>> {
        self.bus.read_register(register)
    }

    pub fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), ExpanderError<I2C::Error>> {
        self.bus.write_register(register, value)
    }

    /// Read one byte at the chip's current address pointer.
    ///
    /// Only meaningful together with [`write_byte`](Self::write_byte), which
    /// moves the pointer.
    pub fn read_byte(&mut self) -> Result<u8, ExpanderError<I2C::Error>> {
        self.bus.read_byte()
    }

    pub fn write_byte(&mut self, value: u8) -> Result<(), ExpanderError<I2C::Error>> {
        self.bus.write_byte(value)
    }

    // -----------------------------------------------------------------------
    // Pin configuration
    // -----------------------------------------------------------------------

    /// Set the direction of `pin`.
    pub fn pin_mode(
        &mut self,
        pin: u8,
        direction: Direction,
    ) -> Result<(), ExpanderError<I2C::Error>> {
        self.bus
            .update_register_bit(pin, direction == Direction::Input, IODIRA, IODIRB)
    }

    /// Enable or disable the internal 100 kΩ pull-up of `pin`.
    pub fn pull_up(&mut self, pin: u8, enabled: bool) -> Result<(), ExpanderError<I2C::Error>> {
        self.bus.update_register_bit(pin, enabled, GPPUA, GPPUB)
    }

    /// Arm the interrupt of `pin`.
    ///
    /// In [`InterruptMode::Change`] the pin is compared against its previous
    /// value. Rising and falling compare against a default value (0 and 1
    /// respectively); any difference raises the interrupt.
    ///
    /// The interrupt condition ends when the port's capture register or the
    /// port itself is read.
    pub fn setup_interrupt_pin(
        &mut self,
        pin: u8,
        mode: InterruptMode,
    ) -> Result<(), ExpanderError<I2C::Error>> {
        self.bus
            .update_register_bit(pin, mode != InterruptMode::Change, INTCONA, INTCONB)?;
        self.bus
            .update_register_bit(pin, mode == InterruptMode::Falling, DEFVALA, DEFVALB)?;
        self.bus.update_register_bit(pin, true, GPINTENA, GPINTENB)
    }

    /// Stop `pin` from raising interrupts.
    pub fn disable_interrupt_pin(&mut self, pin: u8) -> Result<(), ExpanderError<I2C::Error>> {
        self.bus.update_register_bit(pin, false, GPINTENA, GPINTENB)
    }

    /// Apply a complete [`PinConfig`].
    ///
    /// Direction, pull-up and interrupt are three independent
    /// read-modify-write sequences; the first failing one aborts the rest.
    pub fn configure_pin(
        &mut self,
        pin: u8,
        config: PinConfig,
    ) -> Result<(), ExpanderError<I2C::Error>> {
        if !is_valid_pin(pin) {
            return Err(ExpanderError::InvalidPin(pin));
        }
        self.pin_mode(pin, config.direction)?;
        self.pull_up(pin, config.pull_up)?;
        match config.interrupt {
            Some(mode) => self.setup_interrupt_pin(pin, mode),
            None => self.disable_interrupt_pin(pin),
        }
    }

    /// Configure the INT output pins. Both IOCON addresses get the same
    /// settings.
    ///
    /// * `mirroring`: OR the INTA and INTB outputs together.
    /// * `open_drain`: drive INT as open-drain instead of push-pull.
    /// * `polarity`: active level of INT when push-pull.
    pub fn setup_interrupts(
        &mut self,
        mirroring: bool,
        open_drain: bool,
        polarity: Level,
    ) -> Result<(), ExpanderError<I2C::Error>> {
        for register in [IOCONA, IOCONB] {
            let mut value = self.bus.read_register(register)?;
            value = with_bit(value, IOCON_MIRROR, mirroring);
            value = with_bit(value, IOCON_ODR, open_drain);
            value = with_bit(value, IOCON_INTPOL, polarity == Level::High);
            self.bus.write_register(register, value)?;
        }
        Ok(())
    }

    /// Enable or disable sequential operation (address pointer
    /// auto-increment). Enabled is the power-on default; the two-port reads
    /// of this driver require it.
    pub fn set_sequential_operation(
        &mut self,
        enabled: bool,
    ) -> Result<(), ExpanderError<I2C::Error>> {
        for register in [IOCONA, IOCONB] {
            self.bus.update_register(register, IOCON_SEQOP, !enabled)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Interrupt capture
    // -----------------------------------------------------------------------

    /// Read the levels of `port` latched when its interrupt fired.
    ///
    /// This read has two effects by hardware contract: it returns the
    /// captured levels **and** clears the port's pending interrupt.
    pub fn read_interrupt_capture(&mut self, port: Port) -> Result<u8, ExpanderError<I2C::Error>> {
        self.bus.read_register(port.register(INTCAPA, INTCAPB))
    }

    /// Read both capture registers, port B in the high byte.
    ///
    /// Issues one read per port, A first, so each port's pending interrupt
    /// is cleared exactly once. If the port A read fails port B is left
    /// untouched.
    pub fn read_interrupt_capture_both(&mut self) -> Result<u16, ExpanderError<I2C::Error>> {
        let a = self.read_interrupt_capture(Port::A)?;
        let b = self.read_interrupt_capture(Port::B)?;
        Ok(u16::from(a) | (u16::from(b) << 8))
    }

    /// Pin that raised the pending interrupt, port A scanned first.
    ///
    /// `None` when no interrupt flag is set.
    pub fn last_interrupt_pin(&mut self) -> Result<Option<u8>, ExpanderError<I2C::Error>> {
        let intf = self.bus.read_register(INTFA)?;
        if intf != 0 {
            return Ok(Some(intf.trailing_zeros() as u8));
        }

        let intf = self.bus.read_register(INTFB)?;
        if intf != 0 {
            return Ok(Some(intf.trailing_zeros() as u8 + 8));
        }

        Ok(None)
    }

    /// Captured level of the pin that raised the pending interrupt.
    ///
    /// Reads the capture register and therefore clears that port's
    /// interrupt.
    pub fn last_interrupt_pin_value(&mut self) -> Result<Option<Level>, ExpanderError<I2C::Error>> {
        let Some(pin) = self.last_interrupt_pin()? else {
            return Ok(None);
        };
        let captured = self
            .bus
            .read_register(register_for_pin(pin, INTCAPA, INTCAPB))?;
        Ok(Some(Level::from((captured >> bit_for_pin(pin)) & 1 == 1)))
    }

    // -----------------------------------------------------------------------
    // GPIO
    // -----------------------------------------------------------------------

    /// Current levels of one port. Also clears the port's pending interrupt.
    pub fn read_gpio(&mut self, port: Port) -> Result<u8, ExpanderError<I2C::Error>> {
        self.bus.read_register(port.register(GPIOA, GPIOB))
    }

    /// Current levels of all 16 pins in one sequential read, port B in the
    /// high byte.
    pub fn read_gpio_both(&mut self) -> Result<u16, ExpanderError<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.bus.read_registers(GPIOA, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Write all 16 output levels in one sequential write.
    pub fn write_gpio_both(&mut self, value: u16) -> Result<(), ExpanderError<I2C::Error>> {
        self.bus.write_register_pair(GPIOA, value.to_le_bytes())
    }

    /// Drive an output pin, keeping the other latches of its port.
    pub fn digital_write(&mut self, pin: u8, level: Level) -> Result<(), ExpanderError<I2C::Error>> {
        if !is_valid_pin(pin) {
            return Err(ExpanderError::InvalidPin(pin));
        }
        let latches = self.bus.read_register(register_for_pin(pin, OLATA, OLATB))?;
        let value = with_bit(latches, bit_for_pin(pin), level == Level::High);
        self.bus
            .write_register(register_for_pin(pin, GPIOA, GPIOB), value)
    }

    /// Current level of one pin.
    pub fn digital_read(&mut self, pin: u8) -> Result<Level, ExpanderError<I2C::Error>> {
        if !is_valid_pin(pin) {
            return Err(ExpanderError::InvalidPin(pin));
        }
        let levels = self.bus.read_register(register_for_pin(pin, GPIOA, GPIOB))?;
        Ok(Level::from((levels >> bit_for_pin(pin)) & 1 == 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimAccess, SimulatedExpander};

    const ADDR: u8 = 0x21;

    fn setup() -> (SimulatedExpander, Mcp23017<SimulatedExpander>) {
        let sim = SimulatedExpander::new(ADDR);
        let mcp = Mcp23017::new(sim.clone(), ADDR);
        (sim, mcp)
    }

    fn written_registers(sim: &SimulatedExpander) -> Vec<u8> {
        sim.accesses()
            .into_iter()
            .filter_map(|a| match a {
                SimAccess::Write(reg, _) => Some(reg),
                SimAccess::Read(_) => None,
            })
            .collect()
    }

    // ── Construction and init ────────────────────────────────────────

    #[test]
    fn new_generates_no_traffic() {
        let (sim, mcp) = setup();
        assert_eq!(sim.transactions(), 0);
        assert_eq!(mcp.address(), ADDR);
        assert!(mcp.last_error().is_none());
    }

    #[test]
    fn init_sets_inputs_with_pin_zero_output() {
        let (sim, mut mcp) = setup();
        mcp.init().unwrap();
        assert_eq!(sim.register(IODIRA), 0b1111_1110);
        assert_eq!(sim.register(IODIRB), 0b1111_1110);
    }

    #[test]
    fn init_failure_caches_error_kind() {
        let sim = SimulatedExpander::new(ADDR);
        // Wrong address: the chip never acknowledges.
        let mut mcp = Mcp23017::new(sim.clone(), 0x22);

        assert!(matches!(mcp.init(), Err(ExpanderError::I2c(_))));
        assert!(matches!(
            mcp.last_error(),
            Some(ErrorKind::NoAcknowledge(_))
        ));
    }

    // ── Pin configuration ────────────────────────────────────────────

    #[test]
    fn pin_mode_and_pull_up_touch_only_their_bit() {
        let (sim, mut mcp) = setup();
        mcp.init().unwrap();

        mcp.pin_mode(0, Direction::Input).unwrap();
        mcp.pin_mode(9, Direction::Output).unwrap();
        mcp.pull_up(3, true).unwrap();
        mcp.pull_up(12, true).unwrap();

        assert_eq!(sim.register(IODIRA), 0b1111_1111);
        assert_eq!(sim.register(IODIRB), 0b1111_1100);
        assert_eq!(sim.register(GPPUA), 0b0000_1000);
        assert_eq!(sim.register(GPPUB), 0b0001_0000);
    }

    #[test]
    fn configure_pin_uses_port_and_bit_for_every_pin() {
        for pin in 0..16u8 {
            let (sim, mut mcp) = setup();
            mcp.configure_pin(pin, PinConfig::encoder_input()).unwrap();

            let port = Port::of(pin);
            let bit = 1u8 << (pin % 8);
            assert_eq!(sim.register(port.register(GPPUA, GPPUB)), bit, "pin {}", pin);
            assert_eq!(sim.register(port.register(GPINTENA, GPINTENB)), bit, "pin {}", pin);
            assert_eq!(sim.register(port.register(INTCONA, INTCONB)), 0);

            // The other port is untouched.
            let other = if port == Port::A { Port::B } else { Port::A };
            assert_eq!(sim.register(other.register(GPPUA, GPPUB)), 0);
            assert_eq!(sim.register(other.register(GPINTENA, GPINTENB)), 0);
        }
    }

    #[test]
    fn configure_pin_writes_exactly_five_registers() {
        let (sim, mut mcp) = setup();
        mcp.configure_pin(10, PinConfig::encoder_input()).unwrap();
        assert_eq!(
            written_registers(&sim),
            vec![IODIRB, GPPUB, INTCONB, DEFVALB, GPINTENB]
        );
    }

    #[test]
    fn configure_pin_without_interrupt_disables_it() {
        let (sim, mut mcp) = setup();
        mcp.setup_interrupt_pin(4, InterruptMode::Change).unwrap();
        mcp.configure_pin(
            4,
            PinConfig {
                direction: Direction::Input,
                pull_up: false,
                interrupt: None,
            },
        )
        .unwrap();
        assert_eq!(sim.register(GPINTENA), 0);
    }

    #[test]
    fn falling_interrupt_compares_against_one() {
        let (sim, mut mcp) = setup();
        mcp.setup_interrupt_pin(2, InterruptMode::Falling).unwrap();
        assert_eq!(sim.register(INTCONA), 0b100);
        assert_eq!(sim.register(DEFVALA), 0b100);

        mcp.setup_interrupt_pin(2, InterruptMode::Rising).unwrap();
        assert_eq!(sim.register(INTCONA), 0b100);
        assert_eq!(sim.register(DEFVALA), 0);
    }

    #[test]
    fn invalid_pin_is_rejected_without_bus_traffic() {
        let (sim, mut mcp) = setup();
        assert!(matches!(
            mcp.configure_pin(16, PinConfig::encoder_input()),
            Err(ExpanderError::InvalidPin(16))
        ));
        assert!(matches!(mcp.pull_up(200, true), Err(ExpanderError::InvalidPin(200))));
        assert!(matches!(mcp.digital_read(16), Err(ExpanderError::InvalidPin(16))));
        assert!(matches!(
            mcp.digital_write(16, Level::High),
            Err(ExpanderError::InvalidPin(16))
        ));
        assert_eq!(sim.transactions(), 0);
    }

    #[test]
    fn failed_read_skips_the_write() {
        let (sim, mut mcp) = setup();
        sim.fail_next(1);
        assert!(mcp.pull_up(1, true).is_err());
        assert!(written_registers(&sim).is_empty());
        assert_eq!(mcp.last_error(), Some(ErrorKind::Bus));
    }

    #[test]
    fn setup_interrupts_sets_iocon_bits() {
        let (sim, mut mcp) = setup();
        mcp.setup_interrupts(true, false, Level::High).unwrap();
        assert_eq!(sim.register(IOCONA), 0b0100_0010);
        assert_eq!(sim.register(IOCONB), 0b0100_0010);
    }

    #[test]
    fn sequential_operation_toggles_seqop() {
        let (sim, mut mcp) = setup();
        mcp.set_sequential_operation(false).unwrap();
        assert_eq!(sim.register(IOCONA), 1 << IOCON_SEQOP);
        mcp.set_sequential_operation(true).unwrap();
        assert_eq!(sim.register(IOCONA), 0);
    }

    // ── Interrupt capture ────────────────────────────────────────────

    #[test]
    fn capture_both_composes_port_b_high() {
        let (sim, mut mcp) = setup();
        for pin in 0..16 {
            mcp.configure_pin(pin, PinConfig::encoder_input()).unwrap();
        }
        sim.set_inputs(0xAB_CD);

        assert_eq!(mcp.read_interrupt_capture_both().unwrap(), 0xAB_CD);
    }

    #[test]
    fn capture_both_clears_each_port_exactly_once() {
        let (sim, mut mcp) = setup();
        for pin in 0..16 {
            mcp.configure_pin(pin, PinConfig::encoder_input()).unwrap();
        }
        sim.set_inputs(0x0101);
        assert!(sim.interrupt_pending(Port::A));
        assert!(sim.interrupt_pending(Port::B));

        mcp.read_interrupt_capture_both().unwrap();

        assert!(!sim.interrupt_pending(Port::A));
        assert!(!sim.interrupt_pending(Port::B));
        assert_eq!(sim.intcap_reads(Port::A), 1);
        assert_eq!(sim.intcap_reads(Port::B), 1);
    }

    #[test]
    fn capture_single_port_leaves_other_pending() {
        let (sim, mut mcp) = setup();
        for pin in 0..16 {
            mcp.configure_pin(pin, PinConfig::encoder_input()).unwrap();
        }
        sim.set_inputs(0x0101);

        assert_eq!(mcp.read_interrupt_capture(Port::A).unwrap(), 0x01);
        assert!(!sim.interrupt_pending(Port::A));
        assert!(sim.interrupt_pending(Port::B));
    }

    #[test]
    fn capture_failure_is_an_error_not_a_value() {
        let (sim, mut mcp) = setup();
        sim.fail_transactions(true);
        assert!(mcp.read_interrupt_capture_both().is_err());
        assert_eq!(mcp.last_error(), Some(ErrorKind::Bus));
    }

    #[test]
    fn capture_both_stops_after_port_a_failure() {
        let (sim, mut mcp) = setup();
        sim.fail_next(1);
        assert!(mcp.read_interrupt_capture_both().is_err());
        assert_eq!(sim.intcap_reads(Port::B), 0);
    }

    #[test]
    fn last_interrupt_pin_scans_port_a_first() {
        let (sim, mut mcp) = setup();
        assert_eq!(mcp.last_interrupt_pin().unwrap(), None);

        sim.poke(INTFB, 0b0000_0100);
        assert_eq!(mcp.last_interrupt_pin().unwrap(), Some(10));

        sim.poke(INTFA, 0b0010_0000);
        assert_eq!(mcp.last_interrupt_pin().unwrap(), Some(5));
    }

    #[test]
    fn last_interrupt_pin_value_reads_capture() {
        let (sim, mut mcp) = setup();
        mcp.configure_pin(13, PinConfig::encoder_input()).unwrap();
        assert_eq!(mcp.last_interrupt_pin_value().unwrap(), None);

        sim.set_pin(13, true);
        assert_eq!(mcp.last_interrupt_pin_value().unwrap(), Some(Level::High));
        assert!(!sim.interrupt_pending(Port::B));
    }

    // ── GPIO ─────────────────────────────────────────────────────────

    #[test]
    fn gpio_round_trip_through_outputs() {
        let (sim, mut mcp) = setup();
        mcp.write_register(IODIRA, 0x00).unwrap();
        mcp.write_register(IODIRB, 0x00).unwrap();

        mcp.write_gpio_both(0x1234).unwrap();
        assert_eq!(sim.register(OLATA), 0x34);
        assert_eq!(sim.register(OLATB), 0x12);
        assert_eq!(mcp.read_gpio_both().unwrap(), 0x1234);
        assert_eq!(mcp.read_gpio(Port::B).unwrap(), 0x12);
    }

    #[test]
    fn digital_write_keeps_other_latches() {
        let (sim, mut mcp) = setup();
        mcp.write_register(IODIRB, 0x00).unwrap();
        mcp.write_register(OLATB, 0b1000_0001).unwrap();

        mcp.digital_write(9, Level::High).unwrap();
        assert_eq!(sim.register(OLATB), 0b1000_0011);

        mcp.digital_write(15, Level::Low).unwrap();
        assert_eq!(sim.register(OLATB), 0b0000_0011);
    }

    #[test]
    fn digital_read_reports_input_level() {
        let (sim, mut mcp) = setup();
        sim.set_pin(6, true);
        assert_eq!(mcp.digital_read(6).unwrap(), Level::High);
        assert_eq!(mcp.digital_read(7).unwrap(), Level::Low);
    }

    #[test]
    fn raw_byte_access_follows_pointer() {
        let (sim, mut mcp) = setup();
        sim.poke(GPPUA, 0x5A);
        mcp.write_byte(GPPUA).unwrap();
        assert_eq!(mcp.read_byte().unwrap(), 0x5A);
    }

    #[test]
    fn release_returns_bus_handle() {
        let (_sim, mcp) = setup();
        let handle = mcp.release();
        assert_eq!(handle.address(), ADDR);
    }
}
