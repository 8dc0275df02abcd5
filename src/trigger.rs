//! Implements edge-triggered capture arming, the auto trigger watchdog, and a rising/falling
//! edge detector with hysteresis for emulating the analog comparator.

use crate::config::{ChannelId, TimeBase, TriggerMode};
use crate::sampler::Acquisition;
use crate::sys::ADC_MAX;

/// Time an auto trigger waits for an edge before showing a flat line.
pub const TRIGGER_TIMEOUT_MS: u32 = 2000;

/// Sample value of a flat trace for each channel, matching the idle output of its frontend.
const NEUTRAL_LEVEL: [u8; 2] = [31, 45];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising  = 0b01,
    Falling = 0b10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Below,
    Above
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector {
    state: State,
    level: u16, // if let Fresh = state { state = if sample < level { Below } else { Above } }
    below: u16, // if sample < below { state = Below }
    above: u16, // if sample > above { state = Above }
}

impl EdgeDetector {
    /// Detector switching at `level` ADC codes with a dead zone of `hysteresis` codes on
    /// either side.
    ///
    /// A sample strictly above the dead zone puts the detector above the level, one strictly
    /// below it puts it below; samples inside the dead zone keep the previous side. The
    /// crossing from below to above is a rising edge and the opposite crossing a falling edge.
    /// With the bandgap level of 225 and a hysteresis of 4, a signal must climb past 229 after
    /// having dropped under 221 to report a rising edge.
    ///
    /// Both thresholds are kept strictly inside the converter range, so an edge in either
    /// direction is always reachable.
    pub fn new(level: u16, hysteresis: u16) -> EdgeDetector {
        EdgeDetector {
            state: State::Fresh,
            level,
            below: level.saturating_sub(hysteresis).clamp(1, ADC_MAX),
            above: level.saturating_add(hysteresis).min(ADC_MAX - 1),
        }
    }

    /// Process one sample, returning the edge it completes, if any.
    pub fn process(&mut self, sample: u16) -> Option<Edge> {
        match self.state {
            State::Fresh => {
                self.state = if sample < self.level { State::Below } else { State::Above };
                None
            }
            State::Below if sample > self.above => {
                self.state = State::Above;
                Some(Edge::Rising)
            }
            State::Above if sample < self.below => {
                self.state = State::Below;
                Some(Edge::Falling)
            }
            _ => None
        }
    }

    /// Scan incoming data for an edge of either polarity.
    ///
    /// This function advances `samples` forward, moving past the samples that have been
    /// processed. If an edge has been detected, `samples` starts after the sample that caused it.
    pub fn scan(&mut self, samples: &mut &[u16]) -> Option<Edge> {
        while let [sample, rest @ ..] = *samples {
            *samples = rest;
            if let Some(edge) = self.process(*sample) {
                return Some(edge)
            }
        }
        None
    }

    /// Like `scan`, but returns the amount of consumed samples.
    pub fn find(&mut self, mut samples: &[u16]) -> (usize, Option<Edge>) {
        let len_before = samples.len();
        let edge_opt = self.scan(&mut samples);
        let len_after = samples.len();
        (len_before - len_after, edge_opt)
    }
}

/// Progress of a triggered capture on channel A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// Waiting for a qualifying edge.
    Idle,
    /// Capturing into the sample buffers.
    Armed,
    /// Capture handed to the foreground and not consumed yet.
    Complete,
}

impl TriggerState {
    pub fn of(acquisition: &Acquisition) -> TriggerState {
        let channel_a = acquisition.config().channel(ChannelId::A);
        if channel_a.armed {
            TriggerState::Armed
        } else if channel_a.draw_ready {
            TriggerState::Complete
        } else {
            TriggerState::Idle
        }
    }
}

/// Handle a comparator edge at `now_ms`. Returns `true` if it started a new capture.
///
/// An edge only re-arms once the previous capture has completed and been consumed; edges
/// arriving while capturing are ignored apart from feeding the watchdog.
pub(crate) fn on_edge(acquisition: &mut Acquisition, now_ms: u32) -> bool {
    acquisition.last_edge_ms = now_ms;
    if acquisition.config().trigger_mode() == TriggerMode::Off ||
            TriggerState::of(acquisition) != TriggerState::Idle {
        return false
    }
    acquisition.arm();
    log::trace!("trigger armed at {}ms", now_ms);
    true
}

pub(crate) fn timeout_threshold(time_base: TimeBase) -> u32 {
    if time_base.is_slow() {
        4 * TRIGGER_TIMEOUT_MS
    } else {
        TRIGGER_TIMEOUT_MS
    }
}

/// Check whether the auto trigger gave up waiting for an edge at `now_ms`. On timeout the
/// buffer of `channel` is flattened to its neutral level and `true` is returned.
pub(crate) fn check_timeout(acquisition: &mut Acquisition, channel: ChannelId, now_ms: u32)
        -> bool {
    let config = acquisition.config();
    if !config.trigger_mode().behavior().auto_timeout {
        return false
    }
    let threshold = timeout_threshold(config.channel(channel).time_base);
    if now_ms.wrapping_sub(acquisition.last_edge_ms) <= threshold {
        return false
    }
    if let Some(buffer) = acquisition.buffer_mut(channel) {
        buffer.fill(NEUTRAL_LEVEL[channel.index()]);
    }
    true
}
