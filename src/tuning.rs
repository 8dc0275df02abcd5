//! Frequency to musical note identification using integer period counting and a table of
//! reference frequencies.

use std::fmt;

use crate::params::CPU_CLOCK_HZ;

/// Reference frequencies of the fourth octave, in tenths of a hertz. The first and last entries
/// are guard bands just outside the octave; entries 1 to 12 are the notes C to B.
pub const REFERENCE_FREQ10: [u16; 14] = [
    2589, // low guard
    2616, // C
    2772, // C#
    2937, // D
    3111, // D#
    3296, // E
    3492, // F
    3700, // F#
    3920, // G
    4153, // G#
    4400, // A
    4662, // A#
    4939, // B
    5001, // high guard
];

const NOTE_NAMES: [&str; 12] = ["C ", "C#", "D ", "D#", "E ", "F ", "F#", "G ", "G#", "A ", "A#", "B "];

const LOW_GUARD: u32 = REFERENCE_FREQ10[0] as u32;
const HIGH_GUARD: u32 = REFERENCE_FREQ10[13] as u32;

const PRESET_OCTAVE: i8 = 4;
const MAX_OCTAVE: i8 = 8;
const MAX_FOLDS: usize = 5;
/// Half-width of the window a frequency must fall into to match a note.
pub(crate) const MATCH_PERCENT: u32 = 3;
/// Half-width of the window in which a matched note is considered in tune.
const IN_TUNE_PERCENT: u32 = 1;

/// Horizontal center of the deviation indicator and its rightmost pixel.
const DEVIATION_CENTER: i32 = 64;
const DEVIATION_MAX_X: i32 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pitch {
    /// Still below the reference octave after folding.
    TooLow,
    /// Zero frequency, or inside the octave but between note windows.
    Unmatched,
    /// Note number 1 (C) to 12 (B).
    Note(u8),
    /// Still above the reference octave after folding.
    TooHigh,
}

impl Pitch {
    /// Numeric code shown by the firmware: -1 too low, 0 none, 1..=12 note, 99 too high.
    pub fn index(self) -> i8 {
        match self {
            Self::TooLow  => -1,
            Self::Unmatched => 0,
            Self::Note(note) => note as i8,
            Self::TooHigh => 99,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Note(note @ 1..=12) => NOTE_NAMES[note as usize - 1],
            _ => "..",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteReading {
    pub pitch: Pitch,
    pub octave: u8,
    /// Measured frequency ×10 folded into the reference octave.
    pub folded: u32,
}

impl fmt::Display for NoteReading {
    /// Tuner label: arrows point towards the side the frequency must move to.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (left, right) = match self.pitch {
            Pitch::TooLow    => ("<<", "< "),
            Pitch::Unmatched => ("<<", ">>"),
            Pitch::Note(_)   => (" >", "< "),
            Pitch::TooHigh   => (" >", ">>"),
        };
        write!(f, "{}{}{}{}", left, self.pitch.name(), self.octave, right)
    }
}

/// Identify the note closest to `freq10` (tenths of a hertz).
pub fn identify(freq10: u32) -> NoteReading {
    if freq10 == 0 {
        return NoteReading { pitch: Pitch::Unmatched, octave: 0, folded: 0 }
    }

    let mut pitch = Pitch::Unmatched;
    let mut octave = PRESET_OCTAVE;
    let mut folded = freq10;
    for _ in 0..MAX_FOLDS {
        if folded > LOW_GUARD && folded < HIGH_GUARD {
            break
        }
        if folded > HIGH_GUARD {
            folded /= 2;
            octave += 1;
            pitch = Pitch::TooHigh;
        }
        if folded < LOW_GUARD {
            folded *= 2;
            octave -= 1;
            pitch = Pitch::TooLow;
        }
    }
    let octave = octave.clamp(0, MAX_OCTAVE) as u8;

    for note in 1..=12 {
        let (lower, upper) = limits(REFERENCE_FREQ10[note] as u32, MATCH_PERCENT);
        if folded > lower && folded < upper {
            pitch = Pitch::Note(note as u8);
            break
        }
    }
    NoteReading { pitch, octave, folded }
}

/// Window of `nominal ± percent`, truncated to integers and saturated to the `u32` range.
pub fn limits(nominal: u32, percent: u32) -> (u32, u32) {
    let scale = |factor: u32| (nominal as u64 * factor as u64 / 100).min(u32::MAX as u64) as u32;
    (scale(100u32.saturating_sub(percent)), scale(100 + percent))
}

/// Whether `folded` is within 1% of the nominal frequency of `note`.
pub fn is_in_tune(note: u8, folded: u32) -> bool {
    if !(1..=12).contains(&note) {
        return false
    }
    let (lower, upper) = limits(REFERENCE_FREQ10[note as usize] as u32, IN_TUNE_PERCENT);
    folded >= lower && folded < upper
}

/// Distance of a reading from its nominal note frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deviation {
    /// Position of the indicator needle, 12 pixels per percent around the center.
    pub xpos: u8,
    /// Relative deviation in tenths of a percent.
    pub permille: i16,
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign = if self.permille >= 0 { '+' } else { '-' };
        let magnitude = self.permille.unsigned_abs();
        write!(f, "{}{}.{}%", sign, magnitude / 10, magnitude % 10)
    }
}

pub fn deviation(pitch: Pitch, folded: u32) -> Deviation {
    let Pitch::Note(note @ 1..=12) = pitch else {
        return Deviation::default()
    };
    let nominal = REFERENCE_FREQ10[note as usize] as i32;
    let diff = folded as i32 - nominal;
    Deviation {
        xpos: (DEVIATION_CENTER + diff * 1200 / nominal).clamp(0, DEVIATION_MAX_X) as u8,
        permille: (diff * 1000 / nominal) as i16,
    }
}

/// Convert a period in CPU cycles to a frequency in tenths of a hertz.
pub fn period_to_frequency10(count: u32) -> u32 {
    if count == 0 {
        return 0
    }
    (CPU_CLOCK_HZ as u64 * 10 / count as u64) as u32
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_reference_a() {
        let reading = identify(4400);
        assert_eq!(reading, NoteReading { pitch: Pitch::Note(10), octave: 4, folded: 4400 });
        assert_eq!(reading.pitch.index(), 10);
        assert_eq!(reading.to_string(), " >A 4< ");
    }

    #[test]
    fn test_octave_above() {
        let reading = identify(8800);
        assert_eq!(reading, NoteReading { pitch: Pitch::Note(10), octave: 5, folded: 4400 });
    }

    #[test]
    fn test_octave_below() {
        let reading = identify(1308); // C3
        assert_eq!(reading, NoteReading { pitch: Pitch::Note(1), octave: 3, folded: 2616 });
    }

    #[test]
    fn test_in_range_does_not_fold() {
        for &freq10 in &REFERENCE_FREQ10[1..13] {
            let reading = identify(freq10 as u32);
            assert_eq!(reading.octave, 4);
            assert_eq!(reading.folded, freq10 as u32);
        }
    }

    #[test]
    fn test_zero() {
        let reading = identify(0);
        assert_eq!(reading.pitch, Pitch::Unmatched);
        assert_eq!(reading.pitch.index(), 0);
        assert_eq!(reading.to_string(), "<<..0>>");
    }

    #[test]
    fn test_too_high() {
        // 5 folds are not enough to reach the reference octave
        let reading = identify(500_000);
        assert_eq!(reading.pitch, Pitch::TooHigh);
        assert_eq!(reading.pitch.index(), 99);
        assert_eq!(reading.octave, 8);
        assert_eq!(reading.folded, 15625);
        assert_eq!(reading.to_string(), " >..8>>");
    }

    #[test]
    fn test_too_low() {
        let reading = identify(10);
        assert_eq!(reading.pitch, Pitch::TooLow);
        assert_eq!(reading.pitch.index(), -1);
        assert_eq!(reading.octave, 0);
        assert_eq!(reading.folded, 320);
        assert_eq!(reading.to_string(), "<<..0< ");
    }

    #[test]
    fn test_limits() {
        assert_eq!(limits(4400, 3), (4268, 4532));
        assert_eq!(limits(2616, 3), (2537, 2694));
        assert_eq!(limits(4400, 1), (4356, 4444));
        // period counts of a few cycles give frequencies near the top of the range
        assert_eq!(limits(53_333_333, 3), (51_733_333, 54_933_332));
        assert_eq!(limits(u32::MAX, 3), (4_166_118_276, u32::MAX));
    }

    #[test]
    fn test_in_tune() {
        assert!(is_in_tune(10, 4356));
        assert!(is_in_tune(10, 4443));
        assert!(!is_in_tune(10, 4444));
        assert!(!is_in_tune(10, 4355));
        assert!(!is_in_tune(0, 4400));
    }

    #[test]
    fn test_deviation() {
        assert_eq!(deviation(Pitch::Note(10), 4400), Deviation { xpos: 64, permille: 0 });
        let sharp = deviation(Pitch::Note(10), 4444);
        assert_eq!(sharp, Deviation { xpos: 76, permille: 10 });
        assert_eq!(sharp.to_string(), "+1.0%");
        let flat = deviation(Pitch::Note(10), 4290);
        assert_eq!(flat.permille, -25);
        assert_eq!(flat.xpos, 34);
        assert_eq!(flat.to_string(), "-2.5%");
        assert_eq!(deviation(Pitch::TooHigh, 4400), Deviation { xpos: 0, permille: 0 });
    }

    #[test]
    fn test_deviation_clamps() {
        assert_eq!(deviation(Pitch::Note(1), 10_000).xpos, 127);
        assert_eq!(deviation(Pitch::Note(1), 0).xpos, 0);
    }

    #[test]
    fn test_period() {
        assert_eq!(period_to_frequency10(0), 0);
        assert_eq!(period_to_frequency10(36364), 4399);
        assert_eq!(period_to_frequency10(16_000), 10_000);
    }
}
