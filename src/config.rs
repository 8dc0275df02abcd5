//! Configuration of the instrument in terms the user edits in the menu.

use std::fmt;

/// Menu codes are what gets persisted, so every setting has a stable byte encoding.
macro_rules! coded_enum {
    {
        $( #[$attr:meta] )*
        pub enum $name:ident {
            $( $( #[$vattr:meta] )* $variant:ident = $code:literal => $label:literal, )+
        }
    } => {
        $( #[$attr] )*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
        pub enum $name {
            $( $( #[$vattr] )* $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            pub fn code(self) -> u8 {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )+
                    _ => None
                }
            }

            pub(crate) fn ordinal(self) -> usize {
                Self::ALL.iter().position(|&item| item == self).unwrap_or(0)
            }

            /// Move by `delta` menu steps, saturating at `max`.
            pub(crate) fn step(self, delta: i8, max: Self) -> Self {
                let ordinal = (self.ordinal() as isize + delta as isize)
                    .clamp(0, max.ordinal() as isize);
                Self::ALL[ordinal as usize]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(match self {
                    $( Self::$variant => $label, )+
                })
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelId {
    #[default]
    A,
    B,
}

impl ChannelId {
    pub const ALL: [ChannelId; 2] = [ChannelId::A, ChannelId::B];

    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.index() + 1)
    }
}

coded_enum! {
    pub enum Amplification {
        #[default]
        X1 = 1 => "1",
        X2 = 2 => "2",
        X3 = 3 => "3",
        X4 = 4 => "4",
    }
}

impl Amplification {
    /// Channel B only has a single switchable gain stage.
    pub fn max(channel: ChannelId) -> Self {
        match channel {
            ChannelId::A => Self::X4,
            ChannelId::B => Self::X2,
        }
    }
}

coded_enum! {
    /// Horizontal resolution, fastest first.
    pub enum TimeBase {
        Us50  = 1  => " 50us",
        Us100 = 2  => "100us",
        Us200 = 3  => "200us",
        #[default]
        Us500 = 4  => "500us",
        Ms1   = 5  => "1.0ms",
        Ms2   = 6  => "2.0ms",
        Ms5   = 7  => "5.0ms",
        Ms10  = 8  => " 10ms",
        Ms20  = 9  => " 20ms",
        Ms50  = 10 => " 50ms",
        Ms100 = 11 => "100ms",
    }
}

impl TimeBase {
    pub const SLOWEST: TimeBase = TimeBase::Ms100;

    /// Slow sweeps need longer before an auto trigger gives up on the signal.
    pub fn is_slow(self) -> bool {
        self > TimeBase::Ms10
    }
}

coded_enum! {
    pub enum TriggerMode {
        #[default]
        Off            = 0 => "Off   ",
        AutoPositive   = 1 => "Auto +",
        AutoNegative   = 2 => "Auto -",
        NormalPositive = 3 => "Norm +",
        NormalNegative = 4 => "Norm -",
    }
}

coded_enum! {
    /// Reference the comparator measures the trigger input against.
    pub enum TriggerLevel {
        #[default]
        Internal = 0 => "Bandgap",
        External = 1 => "Ext.Ref",
    }
}

coded_enum! {
    pub enum CaptureOption {
        #[default]
        Single         = 1 => "Single",
        Dual           = 2 => "Dual",
        DualAutoDetect = 3 => "Dual(plugin)",
        Frequency      = 4 => "Frequency",
        Tuning         = 5 => "Tuning check",
    }
}

impl CaptureOption {
    /// Whether channel B needs a sample buffer in this mode.
    pub fn uses_channel_b(self) -> bool {
        matches!(self, Self::Dual | Self::DualAutoDetect)
    }

    pub fn is_measurement(self) -> bool {
        matches!(self, Self::Frequency | Self::Tuning)
    }
}

pub const OFFSET_MIN: i8 = -31;
pub const OFFSET_MAX: i8 =  31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub status: bool,
    pub amplification: Amplification,
    pub time_base: TimeBase,
    /// Vertical shift of the trace in pixels.
    pub offset: i8,
    pub trigger_mode: TriggerMode,
    pub trigger_level: TriggerLevel,
    pub option: CaptureOption,
    /// Set by the sampler when a capture is complete, cleared by the foreground once drawn.
    pub draw_ready: bool,
    /// Set by the trigger engine to let the sampler write, cleared on buffer wrap.
    pub armed: bool,
}

impl ChannelConfig {
    fn new(status: bool) -> Self {
        Self {
            status,
            amplification: Default::default(),
            time_base: Default::default(),
            offset: 0,
            trigger_mode: Default::default(),
            trigger_level: Default::default(),
            option: Default::default(),
            draw_ready: true,
            armed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub channels: [ChannelConfig; 2],
    pub selected: ChannelId,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            channels: [ChannelConfig::new(true), ChannelConfig::new(false)],
            selected: ChannelId::A,
        }
    }
}

impl Config {
    pub fn channel(&self, channel: ChannelId) -> &ChannelConfig {
        &self.channels[channel.index()]
    }

    pub fn channel_mut(&mut self, channel: ChannelId) -> &mut ChannelConfig {
        &mut self.channels[channel.index()]
    }

    /// Trigger, level source and capture option only exist on channel A.
    pub fn trigger_mode(&self) -> TriggerMode {
        self.channels[0].trigger_mode
    }

    pub fn option(&self) -> CaptureOption {
        self.channels[0].option
    }

    /// Channel B may sample faster than channel A, never slower.
    pub fn enforce_time_base_order(&mut self) -> bool {
        let limit = self.channels[0].time_base;
        if self.channels[1].time_base > limit {
            self.channels[1].time_base = limit;
            true
        } else {
            false
        }
    }

    /// Channel B is shown for `Dual`; `DualAutoDetect` starts hidden until a signal is found.
    pub fn sync_channel_b_status(&mut self) {
        self.channels[1].status = self.option() == CaptureOption::Dual;
    }

    /// Fields that survive a power cycle are equal.
    pub fn same_persisted(&self, other: &Config) -> bool {
        let [a, b] = &self.channels;
        let [other_a, other_b] = &other.channels;
        a.amplification == other_a.amplification &&
            a.time_base == other_a.time_base &&
            a.trigger_mode == other_a.trigger_mode &&
            a.offset == other_a.offset &&
            a.option == other_a.option &&
            a.trigger_level == other_a.trigger_level &&
            b.amplification == other_b.amplification &&
            b.time_base == other_b.time_base &&
            b.offset == other_b.offset
    }
}
