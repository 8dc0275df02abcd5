//! Emulated hardware for running the instrument on a host.

use std::cell::Cell;
use std::f64::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Error, Result};
use crate::config::ChannelId;
use crate::params::{CPU_CLOCK_HZ, FrontendParameters};
use crate::regs::analog::Comparator;
use crate::sys::{ADC_MAX, Clock, Driver, Storage};
use crate::trigger::EdgeDetector;

/// Comparator reference in ADC codes when using the 1.1 V bandgap with a 5 V supply.
const BANDGAP_LEVEL: u16 = 225;
/// Comparator reference in ADC codes for the external reference divider.
const EXTERNAL_LEVEL: u16 = 512;
const COMPARATOR_HYSTERESIS: u16 = 4;
/// Number of busy polls an emulated conversion takes.
const CONVERSION_POLLS: u8 = 3;

/// Virtual time shared by the emulated peripherals and the code under test.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    micros: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> SimClock {
        Self::default()
    }

    pub fn advance_us(&self, micros: u64) {
        self.micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn now_us(&self) -> u64 {
        self.micros.load(Ordering::Relaxed)
    }
}

impl Clock for SimClock {
    fn millis(&self) -> u32 {
        (self.now_us() / 1000) as u32
    }
}

/// Test signal applied to an input, in ADC codes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Dc(u16),
    Sine { frequency: f64, center: u16, amplitude: u16 },
    Square { frequency: f64, low: u16, high: u16 },
}

impl Signal {
    pub fn sine(frequency: f64) -> Signal {
        Signal::Sine { frequency, center: 512, amplitude: 400 }
    }

    pub fn frequency(&self) -> Option<f64> {
        match *self {
            Self::Dc(_) => None,
            Self::Sine { frequency, .. } | Self::Square { frequency, .. } =>
                Some(frequency).filter(|&frequency| frequency > 0.0),
        }
    }

    pub fn value(&self, time_us: u64) -> u16 {
        let phase = |frequency: f64| (time_us as f64 * frequency / 1e6).fract();
        let value = match *self {
            Self::Dc(level) =>
                level as f64,
            Self::Sine { frequency, center, amplitude } =>
                center as f64 + amplitude as f64 * (TAU * phase(frequency)).sin(),
            Self::Square { frequency, low, high } =>
                if phase(frequency) < 0.5 { high as f64 } else { low as f64 },
        };
        value.round().clamp(0.0, ADC_MAX as f64) as u16
    }
}

#[derive(Debug)]
pub struct SimDriver {
    clock: SimClock,
    signals: [Signal; 2],
    input: ChannelId,
    busy: Cell<u8>,
    result: u16,
    comparator: Comparator,
    detector: EdgeDetector,
    frontends: [FrontendParameters; 2],
    tick_compare: u8,
    period_read_ms: Option<u32>,
}

impl SimDriver {
    pub fn new(clock: SimClock, signals: [Signal; 2]) -> SimDriver {
        SimDriver {
            clock,
            signals,
            input: ChannelId::A,
            busy: Cell::new(0),
            result: 0,
            comparator: Comparator::empty(),
            detector: EdgeDetector::new(BANDGAP_LEVEL, COMPARATOR_HYSTERESIS),
            frontends: Default::default(),
            tick_compare: 0,
            period_read_ms: None,
        }
    }

    pub fn set_signal(&mut self, channel: ChannelId, signal: Signal) {
        self.signals[channel.index()] = signal;
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn frontend(&self, channel: ChannelId) -> FrontendParameters {
        self.frontends[channel.index()]
    }

    pub fn tick_compare(&self) -> u8 {
        self.tick_compare
    }

    fn reference_level(comparator: Comparator) -> u16 {
        if comparator.contains(Comparator::Bandgap) { BANDGAP_LEVEL } else { EXTERNAL_LEVEL }
    }

    /// Feed the current level of the channel A signal to the comparator. Returns `true` if
    /// the comparator would raise its interrupt.
    pub fn poll_comparator(&mut self) -> bool {
        if self.comparator.contains(Comparator::Disable) {
            return false
        }
        let sample = self.signals[ChannelId::A.index()].value(self.clock.now_us());
        match self.detector.process(sample) {
            Some(edge) =>
                self.comparator.contains(Comparator::InterruptEnable) &&
                    self.comparator.interrupt_mode() == edge.comparator_mode(),
            None => false,
        }
    }
}

impl Driver for SimDriver {
    fn select_input(&mut self, channel: ChannelId) {
        self.input = channel;
    }

    fn start_conversion(&mut self) {
        self.result = self.signals[self.input.index()].value(self.clock.now_us());
        self.busy.set(CONVERSION_POLLS);
    }

    fn conversion_busy(&self) -> bool {
        let busy = self.busy.get();
        self.busy.set(busy.saturating_sub(1));
        busy > 0
    }

    fn read_conversion(&mut self) -> u16 {
        self.result
    }

    fn write_comparator(&mut self, value: Comparator) {
        let level = Self::reference_level(value);
        if level != Self::reference_level(self.comparator) {
            self.detector = EdgeDetector::new(level, COMPARATOR_HYSTERESIS);
        }
        self.comparator = value;
    }

    fn write_frontend(&mut self, channel: ChannelId, params: FrontendParameters) {
        self.frontends[channel.index()] = params;
    }

    fn configure_tick(&mut self, compare: u8) {
        self.tick_compare = compare;
    }

    fn read_period(&mut self) -> Option<u32> {
        if !self.comparator.contains(Comparator::InputCapture) {
            return None
        }
        // the capture unit only completes a measurement once per millisecond
        let now_ms = self.clock.millis();
        if self.period_read_ms == Some(now_ms) {
            return None
        }
        let frequency = self.signals[ChannelId::A.index()].frequency()?;
        self.period_read_ms = Some(now_ms);
        Some((CPU_CLOCK_HZ as f64 / frequency).round() as u32)
    }
}

/// EEPROM emulation, erased to `0xff`.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    data: Vec<u8>,
    stuck: Option<usize>,
}

impl MemoryStorage {
    pub fn new(size: usize) -> MemoryStorage {
        MemoryStorage { data: vec![0xff; size], stuck: None }
    }

    /// Make the cell at `addr` ignore writes.
    pub fn with_stuck_cell(mut self, addr: usize) -> MemoryStorage {
        self.stuck = Some(addr);
        self
    }

    /// Flip the low bit of the cell at `addr`.
    pub fn corrupt(&mut self, addr: usize) {
        self.data[addr] ^= 0x01;
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn check_range(&self, addr: usize, len: usize) -> Result<()> {
        match addr.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(Error::AddressOutOfRange { addr, len }),
        }
    }
}

impl Storage for MemoryStorage {
    fn read(&self, addr: usize, data: &mut [u8]) -> Result<()> {
        self.check_range(addr, data.len())?;
        data.copy_from_slice(&self.data[addr..addr + data.len()]);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;
        for (offset, &byte) in data.iter().enumerate() {
            if self.stuck != Some(addr + offset) {
                self.data[addr + offset] = byte;
            }
        }
        Ok(())
    }
}
