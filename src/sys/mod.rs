use crate::Result;
use crate::config::ChannelId;
use crate::params::FrontendParameters;
use crate::regs::analog::Comparator;

/// Largest value returned by the 10-bit ADC.
pub const ADC_MAX: u16 = 1023;

/// Access to the converter, comparator and timers of the microcontroller.
///
/// Methods are only ever called with the driver locked inside a critical section, so
/// implementations do not need to synchronize.
pub trait Driver {
    fn select_input(&mut self, channel: ChannelId);
    fn start_conversion(&mut self);
    fn conversion_busy(&self) -> bool;
    fn read_conversion(&mut self) -> u16;

    /// Run one conversion on `channel` to completion.
    fn convert(&mut self, channel: ChannelId) -> u16 {
        self.select_input(channel);
        self.start_conversion();
        while self.conversion_busy() {
            std::hint::spin_loop();
        }
        self.read_conversion()
    }

    fn write_comparator(&mut self, value: Comparator);
    fn write_frontend(&mut self, channel: ChannelId, params: FrontendParameters);
    fn configure_tick(&mut self, compare: u8);

    /// Latest signal period in CPU clock cycles captured from the comparator output, if any
    /// period has been measured since the last call.
    fn read_period(&mut self) -> Option<u32>;
}

/// Monotonic millisecond counter. Callers compare timestamps with wrapping subtraction.
pub trait Clock {
    fn millis(&self) -> u32;
}

/// Byte-addressable non-volatile memory.
pub trait Storage {
    fn read(&self, addr: usize, data: &mut [u8]) -> Result<()>;
    fn write(&mut self, addr: usize, data: &[u8]) -> Result<()>;
}

pub mod sim;
