//! Rotary encoder with push button, sampled from the main loop.

/// Interval between two samples of the encoder and its button.
pub const DEBOUNCE_MS: u32 = 5;
/// A second click within this time after the first one makes a double click.
pub const DOUBLE_CLICK_MS: u32 = 600;
/// Holding the button for longer than this is reported as `HoldOn`.
pub const HOLD_MS: u32 = 1250;

/// Position change in encoder counts that makes one menu step.
const DETENT_COUNTS: i32 = 3;

const DOUBLE_CLICK_SAMPLES: u16 = (DOUBLE_CLICK_MS / DEBOUNCE_MS) as u16;
const HOLD_SAMPLES: u16 = (HOLD_MS / DEBOUNCE_MS) as u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    #[default]
    Open,
    /// Held down; reported on every poll until released.
    HoldOn,
    /// Released after being held.
    Released,
    /// Clicked once, reported when the double click window expires.
    Pushed,
    DoubleClicked,
}

/// User input gathered during one pass of the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Input {
    pub up: bool,
    pub down: bool,
    pub button: Button,
}

impl Input {
    pub fn any(&self) -> bool {
        self.up || self.down || self.button != Button::Open
    }
}

/// Turns debounced button levels into clicks, double clicks and holds.
#[derive(Debug, Clone, Default)]
pub struct ClickClassifier {
    pressed_prev: bool,
    pressed_samples: u16,
    /// Samples left in the double click window, zero when closed.
    window_samples: u16,
    button: Button,
}

impl ClickClassifier {
    pub fn new() -> ClickClassifier {
        Self::default()
    }

    /// Feed one button sample, taken every `DEBOUNCE_MS`. A level only counts once it has
    /// been seen on two consecutive samples.
    pub fn update(&mut self, pressed: bool) {
        if pressed == self.pressed_prev {
            if pressed {
                self.pressed_samples = self.pressed_samples.saturating_add(1);
                if self.pressed_samples > HOLD_SAMPLES {
                    self.button = Button::HoldOn;
                }
            } else {
                if self.pressed_samples > 0 {
                    if self.button == Button::HoldOn {
                        self.button = Button::Released;
                        self.window_samples = 0;
                    } else if self.window_samples > 0 {
                        self.button = Button::DoubleClicked;
                        self.window_samples = 0;
                    } else {
                        self.window_samples = DOUBLE_CLICK_SAMPLES;
                    }
                }
                self.pressed_samples = 0;
            }
        }

        if self.window_samples > 0 {
            self.window_samples -= 1;
            if self.window_samples == 0 {
                self.button = Button::Pushed;
            }
        }
        self.pressed_prev = pressed;
    }

    /// Current button state. Events are reported once; `HoldOn` persists while held.
    pub fn take(&mut self) -> Button {
        let button = self.button;
        if button != Button::HoldOn {
            self.button = Button::Open;
        }
        button
    }
}

#[derive(Debug, Clone, Default)]
pub struct Encoder {
    sampled_ms: u32,
    position: i32,
    classifier: ClickClassifier,
}

impl Encoder {
    pub fn new(now_ms: u32) -> Encoder {
        Encoder { sampled_ms: now_ms, ..Default::default() }
    }

    /// Sample the raw quadrature `position` and button level if the debounce interval has
    /// elapsed, and report the resulting input.
    pub fn poll(&mut self, now_ms: u32, position: i32, pressed: bool) -> Input {
        let mut input = Input::default();
        if now_ms.wrapping_sub(self.sampled_ms) >= DEBOUNCE_MS {
            self.sampled_ms = now_ms;
            if position - DETENT_COUNTS > self.position {
                self.position = position;
                input.up = true;
            } else if position + DETENT_COUNTS < self.position {
                self.position = position;
                input.down = true;
            }
            self.classifier.update(pressed);
        }
        input.button = self.classifier.take();
        input
    }
}
