//! Bit layouts of the analog comparator and frontend control registers.

use bitflags::bitflags;

bitflags! {
    /// Analog comparator control and status.
    ///
    /// The signal is connected to the inverting input, so the comparator output falls when
    /// the signal rises above the reference.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Comparator: u8 {
        /// Interrupt mode select, bit 0.
        const InterruptMode0  = 1<<0;
        /// Interrupt mode select, bit 1.
        const InterruptMode1  = 1<<1;
        /// Route comparator output to the period-measurement input capture unit.
        const InputCapture    = 1<<2;
        const InterruptEnable = 1<<3;
        const InterruptFlag   = 1<<4;
        const Output          = 1<<5;
        /// Use the internal bandgap reference instead of the external reference pin.
        const Bandgap         = 1<<6;
        const Disable         = 1<<7;
    }
}

impl Comparator {
    pub const MODE_MASK: Comparator =
        Comparator::InterruptMode0.union(Comparator::InterruptMode1);

    /// Interrupt on falling comparator output.
    pub const MODE_FALLING: Comparator = Comparator::InterruptMode1;

    /// Interrupt on rising comparator output.
    pub const MODE_RISING: Comparator = Comparator::MODE_MASK;

    pub fn interrupt_mode(self) -> Comparator {
        self.intersection(Self::MODE_MASK)
    }
}

bitflags! {
    /// Gain stage switches in an input frontend.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GainSelect: u8 {
        const Stage1 = 1<<0;
        const Stage2 = 1<<1;
    }
}
