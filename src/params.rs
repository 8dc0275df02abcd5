//! Low-level parameters of the hardware derived from the user configuration.

use crate::config::{Amplification, ChannelId, Config, TimeBase, TriggerLevel, TriggerMode};
use crate::regs::analog::{Comparator, GainSelect};
use crate::trigger::Edge;

pub const CPU_CLOCK_HZ: u32 = 16_000_000;

/// Period of the sampling tick interrupt.
pub const TICK_PERIOD_US: u32 = 50;

/// Compare value of the tick timer (clocked at 2 MHz) producing `TICK_PERIOD_US`. It is also
/// the PWM period of the channel A offset output, which shares the timer.
pub const TICK_COMPARE: u8 = 100;

impl TimeBase {
    /// Number of ticks skipped between two samples.
    pub fn reload(self) -> u16 {
        const RELOAD: [u16; 11] = [0, 1, 3, 9, 19, 39, 99, 199, 399, 999, 1999];
        RELOAD[self.ordinal()]
    }

    pub fn sample_period_us(self) -> u32 {
        (self.reload() as u32 + 1) * TICK_PERIOD_US
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerBehavior {
    /// Signal edge that arms a capture, `None` when free running.
    pub edge: Option<Edge>,
    /// Whether the display falls back to a flat line when no edge arrives.
    pub auto_timeout: bool,
}

impl TriggerMode {
    pub fn behavior(self) -> TriggerBehavior {
        const fn behavior(edge: Option<Edge>, auto_timeout: bool) -> TriggerBehavior {
            TriggerBehavior { edge, auto_timeout }
        }
        const TABLE: [TriggerBehavior; 5] = [
            behavior(None,                false), // Off
            behavior(Some(Edge::Rising),  true),  // AutoPositive
            behavior(Some(Edge::Falling), true),  // AutoNegative
            behavior(Some(Edge::Rising),  false), // NormalPositive
            behavior(Some(Edge::Falling), false), // NormalNegative
        ];
        TABLE[self.ordinal()]
    }
}

impl Edge {
    /// The signal drives the inverting comparator input, so polarities swap.
    pub(crate) fn comparator_mode(self) -> Comparator {
        match self {
            Self::Rising  => Comparator::MODE_FALLING,
            Self::Falling => Comparator::MODE_RISING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrontendParameters {
    /// Duty of the offset PWM output that centers the amplified signal in the ADC range.
    pub offset_duty: u8,
    pub gain: GainSelect,
}

impl FrontendParameters {
    pub fn derive(channel: ChannelId, amplification: Amplification) -> Self {
        let (offset_duty, gain) = match (channel, amplification) {
            // channel A's offset PWM runs at the tick timer period
            (ChannelId::A, Amplification::X1) =>
                (TICK_COMPARE / 2,  GainSelect::empty()),
            (ChannelId::A, Amplification::X2) =>
                (TICK_COMPARE / 4,  GainSelect::Stage1),
            (ChannelId::A, Amplification::X3) =>
                (TICK_COMPARE / 8,  GainSelect::Stage2),
            (ChannelId::A, Amplification::X4) =>
                (TICK_COMPARE / 16, GainSelect::Stage1 | GainSelect::Stage2),
            // channel B's offset PWM is a full 8-bit timer
            (ChannelId::B, Amplification::X1) =>
                (127, GainSelect::empty()),
            (ChannelId::B, _) =>
                (63,  GainSelect::Stage1),
        };
        FrontendParameters { offset_duty, gain }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceParameters {
    pub frontends: [FrontendParameters; 2],
    pub comparator: Comparator,
    pub reload: [u16; 2],
}

impl DeviceParameters {
    pub fn derive(config: &Config) -> Self {
        let channel_a = config.channel(ChannelId::A);
        let channel_b = config.channel(ChannelId::B);

        // the comparator output always feeds the period measurement
        let mut comparator = Comparator::Output | Comparator::InputCapture;
        if channel_a.trigger_level == TriggerLevel::Internal {
            comparator.insert(Comparator::Bandgap);
        }
        match config.trigger_mode().behavior().edge {
            Some(edge) =>
                comparator.insert(Comparator::InterruptEnable | edge.comparator_mode()),
            None =>
                comparator.insert(Comparator::MODE_FALLING),
        }

        DeviceParameters {
            frontends: [
                FrontendParameters::derive(ChannelId::A, channel_a.amplification),
                FrontendParameters::derive(ChannelId::B, channel_b.amplification),
            ],
            comparator,
            reload: [channel_a.time_base.reload(), channel_b.time_base.reload()],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_reload_monotonic() {
        let reloads = TimeBase::ALL.iter().map(|time_base| time_base.reload()).collect::<Vec<_>>();
        assert!(reloads.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", reloads);
        assert_eq!(TimeBase::Us50.reload(), 0);
        assert_eq!(TimeBase::Ms100.reload(), 1999);
    }

    #[test]
    fn test_sample_period() {
        assert_eq!(TimeBase::Us50.sample_period_us(), 50);
        assert_eq!(TimeBase::Us500.sample_period_us(), 500);
        assert_eq!(TimeBase::Ms1.sample_period_us(), 1000);
        assert_eq!(TimeBase::Ms100.sample_period_us(), 100_000);
    }

    #[test]
    fn test_trigger_behavior() {
        assert_eq!(TriggerMode::Off.behavior(), TriggerBehavior { edge: None, auto_timeout: false });
        assert_eq!(TriggerMode::AutoPositive.behavior().edge, Some(Edge::Rising));
        assert!(TriggerMode::AutoNegative.behavior().auto_timeout);
        assert_eq!(TriggerMode::NormalNegative.behavior().edge, Some(Edge::Falling));
        assert!(!TriggerMode::NormalPositive.behavior().auto_timeout);
    }

    #[test]
    fn test_frontend() {
        let params = FrontendParameters::derive(ChannelId::A, Amplification::X4);
        assert_eq!(params.offset_duty, 6);
        assert_eq!(params.gain, GainSelect::all());
        let params = FrontendParameters::derive(ChannelId::B, Amplification::X2);
        assert_eq!(params, FrontendParameters { offset_duty: 63, gain: GainSelect::Stage1 });
    }

    #[test]
    fn test_comparator_free_running() {
        let params = DeviceParameters::derive(&Config::default());
        assert!(!params.comparator.contains(Comparator::InterruptEnable));
        assert!(params.comparator.contains(Comparator::Bandgap));
        assert!(params.comparator.contains(Comparator::InputCapture));
    }

    #[test]
    fn test_comparator_triggered() {
        let mut config = Config::default();
        config.channels[0].trigger_mode = TriggerMode::NormalPositive;
        config.channels[0].trigger_level = TriggerLevel::External;
        let params = DeviceParameters::derive(&config);
        assert!(params.comparator.contains(Comparator::InterruptEnable));
        assert!(!params.comparator.contains(Comparator::Bandgap));
        assert_eq!(params.comparator.interrupt_mode(), Comparator::MODE_FALLING);

        config.channels[0].trigger_mode = TriggerMode::AutoNegative;
        let params = DeviceParameters::derive(&config);
        assert_eq!(params.comparator.interrupt_mode(), Comparator::MODE_RISING);
    }

    #[test]
    fn test_reload_per_channel() {
        let mut config = Config::default();
        config.channels[0].time_base = TimeBase::Ms1;
        config.channels[1].time_base = TimeBase::Us100;
        assert_eq!(DeviceParameters::derive(&config).reload, [19, 1]);
    }
}
