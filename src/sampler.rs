//! Periodic sampling of both channels into their capture buffers.

use crate::buffer::SampleBuffer;
use crate::config::{CaptureOption, ChannelId, Config, TriggerMode};
use crate::sys::Driver;

/// State shared between the interrupt handlers and the foreground.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub(crate) config: Config,
    channel_a: SampleBuffer,
    /// Only allocated while the capture option shows two channels.
    channel_b: Option<Box<SampleBuffer>>,
    /// Ticks left until the next sample of each channel.
    pub(crate) countdown: [u16; 2],
    pub(crate) last_edge_ms: u32,
}

impl Acquisition {
    pub fn new(config: Config) -> Acquisition {
        let mut acquisition = Acquisition {
            config,
            channel_a: SampleBuffer::new(),
            channel_b: None,
            countdown: [0; 2],
            last_edge_ms: 0,
        };
        acquisition.reseed();
        if config.option().uses_channel_b() {
            acquisition.allocate_channel_b();
        }
        acquisition
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn last_edge_ms(&self) -> u32 {
        self.last_edge_ms
    }

    pub fn buffer(&self, channel: ChannelId) -> Option<&SampleBuffer> {
        match channel {
            ChannelId::A => Some(&self.channel_a),
            ChannelId::B => self.channel_b.as_deref(),
        }
    }

    pub(crate) fn buffer_mut(&mut self, channel: ChannelId) -> Option<&mut SampleBuffer> {
        match channel {
            ChannelId::A => Some(&mut self.channel_a),
            ChannelId::B => self.channel_b.as_deref_mut(),
        }
    }

    pub(crate) fn allocate_channel_b(&mut self) {
        if self.channel_b.is_none() {
            self.channel_b = Some(Box::new(SampleBuffer::new()));
        }
    }

    pub(crate) fn release_channel_b(&mut self) {
        self.channel_b = None;
    }

    /// Reload the decimation countdowns from the configured time bases.
    pub(crate) fn reseed(&mut self) {
        for channel in ChannelId::ALL {
            self.reseed_channel(channel);
        }
    }

    pub(crate) fn reseed_channel(&mut self, channel: ChannelId) {
        self.countdown[channel.index()] = self.config.channel(channel).time_base.reload();
    }

    /// Restart a capture on both channels at once so the traces are aligned at index 0.
    pub(crate) fn arm(&mut self) {
        self.channel_a.rewind();
        if let Some(channel_b) = self.channel_b.as_deref_mut() {
            channel_b.rewind();
        }
        self.countdown = [0; 2];
        for channel in self.config.channels.iter_mut() {
            channel.armed = true;
            channel.draw_ready = false;
        }
    }

    /// Decimate and capture one channel. Returns `true` when its buffer wrapped.
    fn sample<D: Driver>(&mut self, channel: ChannelId, driver: &mut D) -> bool {
        let index = channel.index();
        if self.countdown[index] > 0 {
            self.countdown[index] -= 1;
            return false
        }
        let sample = (driver.convert(channel) / 16) as u8;
        let wrapped = match self.buffer_mut(channel) {
            Some(buffer) => buffer.push(sample),
            None => false,
        };
        self.reseed_channel(channel);
        wrapped
    }

    fn channel_b_active(&self) -> bool {
        let channel_b = &self.config.channels[1];
        self.channel_b.is_some() && !channel_b.draw_ready &&
            (channel_b.status || self.config.option() == CaptureOption::DualAutoDetect)
    }
}

/// Handle one sampling tick. Channel A is always serviced before channel B.
pub(crate) fn tick<D: Driver>(acquisition: &mut Acquisition, driver: &mut D) {
    if acquisition.config.channels[0].armed {
        if acquisition.sample(ChannelId::A, driver) &&
                acquisition.config.trigger_mode() != TriggerMode::Off {
            let channel_a = &mut acquisition.config.channels[0];
            channel_a.armed = false;
            channel_a.draw_ready = true;
        }
    } else {
        acquisition.reseed_channel(ChannelId::A);
    }

    if acquisition.channel_b_active() && acquisition.sample(ChannelId::B, driver) {
        acquisition.config.channels[1].draw_ready = true;
    }
}
