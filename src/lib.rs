//! Acquisition and trigger core of a dual-channel microcontroller oscilloscope.
//!
//! The background side (`Device::on_tick`, `Device::on_edge`) is meant to be called from the
//! sampling timer and analog comparator interrupts; the foreground side (`Menu::poll`) runs
//! from the cooperative main loop. Both only meet inside critical sections owned by `Device`.

pub mod sys;
mod regs;
mod config;
mod params;
mod buffer;
mod sampler;
mod trigger;
mod tuning;
mod persist;
mod frame;
mod device;
mod menu;
mod encoder;

#[derive(Debug)]
pub enum Error {
    AddressOutOfRange { addr: usize, len: usize },
    Verify { expected: u8, actual: u8 },
    Other(Box<dyn std::error::Error + Sync + Send + 'static>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::AddressOutOfRange { addr, len } =>
                write!(f, "storage access {:#x}+{} is out of range", addr, len),
            Self::Verify { expected, actual } =>
                write!(f, "checksum mismatch after write: expected {:#04x}, read back {:#04x}",
                    expected, actual),
            Self::Other(error) =>
                write!(f, "{}", error),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use config::{
    ChannelId,
    Amplification,
    TimeBase,
    TriggerMode,
    TriggerLevel,
    CaptureOption,
    ChannelConfig,
    Config,
    OFFSET_MIN,
    OFFSET_MAX,
};

pub use params::{
    TICK_PERIOD_US,
    TICK_COMPARE,
    TriggerBehavior,
    FrontendParameters,
    DeviceParameters,
};

pub use regs::analog::{
    Comparator,
    GainSelect,
};

pub use buffer::{
    SAMPLE_COUNT,
    SampleBuffer,
};

pub use sampler::Acquisition;

pub use trigger::{
    TRIGGER_TIMEOUT_MS,
    Edge,
    EdgeDetector,
    TriggerState,
};

pub use tuning::{
    REFERENCE_FREQ10,
    Pitch,
    NoteReading,
    Deviation,
    identify,
    deviation,
    limits,
    is_in_tune,
    period_to_frequency10,
};

pub use persist::{
    ADDR_CHECKSUM,
    ADDR_CONFIG_BASE,
    PersistedConfig,
    checksum,
};

pub use frame::{
    SCREEN_WIDTH,
    SCREEN_HEIGHT,
    Frame,
    is_plugged_in,
};

pub use device::Device;

pub use menu::{
    MENU_TIMEOUT_MS,
    MenuState,
    Row,
    Screen,
    Measurement,
    Menu,
};

pub use encoder::{
    DEBOUNCE_MS,
    Button,
    Input,
    ClickClassifier,
    Encoder,
};
