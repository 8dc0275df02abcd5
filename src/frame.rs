//! Snapshot of the capture buffers handed to the display, and the vertical scaling of traces.

use crate::buffer::SAMPLE_COUNT;
use crate::config::{ChannelId, Config};

pub const SCREEN_WIDTH: usize = 128;
pub const SCREEN_HEIGHT: usize = 64;

const BOTTOM: i16 = SCREEN_HEIGHT as i16 - 1;
/// Vertical pixel offset of the lower half of the screen, where channel B is drawn.
const CHANNEL_B_BASELINE: i16 = 31;

/// Samples of the channel B buffer inspected for a plugged-in signal; the last one is skipped.
const PLUG_DETECT_SPAN: usize = SCREEN_WIDTH - 1;
const PLUG_DETECT_MAX_RIPPLE: u8 = 5;
const PLUG_DETECT_MIN_AVERAGE: u16 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub config: Config,
    pub channel_a: [u8; SAMPLE_COUNT],
    pub channel_b: Option<[u8; SAMPLE_COUNT]>,
}

impl Frame {
    /// Whether channel B is drawn next to channel A, sharing the screen height.
    pub fn shows_channel_b(&self) -> bool {
        self.config.channel(ChannelId::B).status && self.channel_b.is_some()
    }

    /// Screen rows of the channel A trace, if its capture is ready to be drawn.
    pub fn trace_a(&self) -> Option<[i16; SAMPLE_COUNT]> {
        let channel = self.config.channel(ChannelId::A);
        if !channel.draw_ready {
            return None
        }
        let halve = self.config.channel(ChannelId::B).status;
        Some(self.channel_a.map(|sample| {
            let mut y = BOTTOM - sample as i16;
            if halve {
                y /= 2;
            }
            clamp_row(y - channel.offset as i16)
        }))
    }

    /// Screen rows of the channel B trace, scaled to half height in the lower half of the screen.
    pub fn trace_b(&self) -> Option<[i16; SAMPLE_COUNT]> {
        if !self.shows_channel_b() {
            return None
        }
        let offset = self.config.channel(ChannelId::B).offset as i16;
        self.channel_b.map(|samples| samples.map(|sample| {
            clamp_row((BOTTOM - sample as i16) / 2 + CHANNEL_B_BASELINE - offset)
        }))
    }
}

/// Allow one row past each border so lines leaving the screen are still drawn towards it.
fn clamp_row(y: i16) -> i16 {
    y.clamp(-1, BOTTOM + 1)
}

/// Whether a capture looks like a connected signal rather than an idle input sitting near
/// ground.
pub fn is_plugged_in(samples: &[u8; SAMPLE_COUNT]) -> bool {
    let span = &samples[..PLUG_DETECT_SPAN];
    let max = span.iter().copied().max().unwrap_or(0);
    let min = span.iter().copied().min().unwrap_or(0);
    let average = span.iter().map(|&sample| sample as u16).sum::<u16>() / PLUG_DETECT_SPAN as u16;
    !(max - min <= PLUG_DETECT_MAX_RIPPLE && average < PLUG_DETECT_MIN_AVERAGE)
}
