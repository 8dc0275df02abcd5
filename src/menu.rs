//! Foreground state machine: settings menu, sample display and configuration saving.

use std::fmt;

use crate::config::{
    Amplification, CaptureOption, ChannelId, Config, TimeBase, TriggerLevel, TriggerMode,
    OFFSET_MAX, OFFSET_MIN,
};
use crate::device::Device;
use crate::encoder::{Button, Input};
use crate::frame::{Frame, is_plugged_in};
use crate::sys::{Driver, Storage};
use crate::tuning::{
    self, Deviation, NoteReading, Pitch, MATCH_PERCENT, identify, is_in_tune, limits,
    period_to_frequency10,
};

/// Without user input for this long the menu gives way to the sample display.
pub const MENU_TIMEOUT_MS: u32 = 5000;
/// Duration of the splash screen.
pub const SPLASH_MS: u32 = 3000;
/// Longest interval between two redraws of the sample display while the frequency is steady.
pub const REDRAW_TIMEOUT_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Startup,
    InitDefaults,
    MenuDefault,
    Settings,
    SelectValues,
    DrawSamples,
    SaveRequest,
    SaveConfirm,
    SaveCommit,
}

impl MenuState {
    /// States a long press can leave for the save dialog.
    fn accepts_save(self) -> bool {
        matches!(self, Self::MenuDefault | Self::Settings | Self::SelectValues | Self::DrawSamples)
    }
}

/// Line of the settings menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Row {
    Channel = 1,
    Amplification,
    TimeBase,
    Offset,
    Trigger,
    TriggerLevel,
    Option,
}

impl Row {
    pub const ALL: [Row; 7] = [
        Row::Channel,
        Row::Amplification,
        Row::TimeBase,
        Row::Offset,
        Row::Trigger,
        Row::TriggerLevel,
        Row::Option,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Trigger, level and option rows are only offered for channel A.
    pub fn last(channel: ChannelId) -> Row {
        match channel {
            ChannelId::A => Row::Option,
            ChannelId::B => Row::Offset,
        }
    }

    fn step(self, delta: i8, last: Row) -> Row {
        let number = (self.number() as i8 + delta).clamp(1, last.number() as i8);
        Self::ALL[number as usize - 1]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Channel       => "Channel",
            Self::Amplification => "Amplify",
            Self::TimeBase      => "Time/div",
            Self::Offset        => "Offset",
            Self::Trigger       => "Trigger",
            Self::TriggerLevel  => "Level",
            Self::Option        => "Option",
        }
    }

    /// Current value of this row for the selected channel, as shown in the menu.
    pub fn value(self, config: &Config) -> String {
        let channel = config.channel(config.selected);
        match self {
            Self::Channel       => config.selected.to_string(),
            Self::Amplification => channel.amplification.to_string(),
            Self::TimeBase      => channel.time_base.to_string(),
            Self::Offset        => channel.offset.to_string(),
            Self::Trigger       => config.trigger_mode().to_string(),
            Self::TriggerLevel  => config.channels[0].trigger_level.to_string(),
            Self::Option        => config.option().to_string(),
        }
    }

    /// Move the value of this row by one menu step, saturating at either end of its range.
    fn edit(self, config: &mut Config, delta: i8) {
        let selected = config.selected;
        match self {
            Self::Channel =>
                config.selected = if delta > 0 { ChannelId::B } else { ChannelId::A },
            Self::Amplification => {
                let channel = config.channel_mut(selected);
                channel.amplification = channel.amplification.step(delta, Amplification::max(selected));
            }
            Self::TimeBase => {
                let channel = config.channel_mut(selected);
                channel.time_base = channel.time_base.step(delta, TimeBase::SLOWEST);
            }
            Self::Offset => {
                let channel = config.channel_mut(selected);
                channel.offset = (channel.offset + delta).clamp(OFFSET_MIN, OFFSET_MAX);
            }
            Self::Trigger => {
                let a = &mut config.channels[0];
                a.trigger_mode = a.trigger_mode.step(delta, TriggerMode::NormalNegative);
            }
            Self::TriggerLevel => {
                let a = &mut config.channels[0];
                a.trigger_level = a.trigger_level.step(delta, TriggerLevel::External);
            }
            Self::Option => {
                let a = &mut config.channels[0];
                a.option = a.option.step(delta, CaptureOption::Tuning);
            }
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Frequency readout for the `Frequency` and `Tuning` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub option: CaptureOption,
    pub frequency10: u32,
    pub reading: NoteReading,
    pub deviation: Deviation,
    pub in_tune: bool,
}

impl Measurement {
    pub fn new(option: CaptureOption, frequency10: u32) -> Measurement {
        let reading = identify(frequency10);
        let in_tune = match reading.pitch {
            Pitch::Note(note) => is_in_tune(note, reading.folded),
            _ => false,
        };
        Measurement {
            option,
            frequency10,
            reading,
            deviation: tuning::deviation(reading.pitch, reading.folded),
            in_tune,
        }
    }
}

/// What the display has to show after a pass of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Splash,
    /// Settings list; `row` is the cursor, absent on the idle menu.
    Settings { config: Config, row: Option<Row>, editing: bool },
    Samples(Frame),
    Measurement(Measurement),
    SaveQuestion { yes: bool },
    SaveResult { ok: bool },
}

/// One step of a turn: `+1` for up, `-1` for down.
fn turn(input: &Input) -> Option<i8> {
    match (input.up, input.down) {
        (true, _) => Some(1),
        (_, true) => Some(-1),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Menu {
    state: MenuState,
    row: Row,
    save_yes: bool,
    entered_ms: u32,
    active_ms: u32,
    drawn_ms: u32,
    frequency10: u32,
    drawn_frequency10: u32,
    force_redraw: bool,
}

impl Menu {
    pub fn new(now_ms: u32) -> Menu {
        Menu {
            state: MenuState::Startup,
            row: Row::Channel,
            save_yes: false,
            entered_ms: now_ms,
            active_ms: now_ms,
            drawn_ms: now_ms,
            frequency10: 0,
            drawn_frequency10: 0,
            force_redraw: false,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn row(&self) -> Row {
        self.row
    }

    /// Last measured frequency of channel A in tenths of a hertz, zero if none.
    pub fn frequency10(&self) -> u32 {
        self.frequency10
    }

    fn enter(&mut self, state: MenuState, now_ms: u32) {
        log::debug!("menu {:?} -> {:?}", self.state, state);
        self.state = state;
        self.entered_ms = now_ms;
    }

    fn expired(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.active_ms) > MENU_TIMEOUT_MS
    }

    fn settings<D: Driver>(&self, device: &Device<D>) -> Screen {
        let (row, editing) = match self.state {
            MenuState::Settings => (Some(self.row), false),
            MenuState::SelectValues => (Some(self.row), true),
            _ => (None, false),
        };
        Screen::Settings { config: device.config(), row, editing }
    }

    /// Run one foreground pass with the input gathered since the previous one.
    pub fn poll<D: Driver, S: Storage>(&mut self, device: &Device<D>, storage: &mut S,
                                       input: Input, now_ms: u32) -> Option<Screen> {
        if input.any() {
            self.active_ms = now_ms;
        }

        match self.state {
            MenuState::Startup => {
                let config = device.restore(storage, now_ms);
                log::info!("starting with {:?}", config);
                self.enter(MenuState::InitDefaults, now_ms);
                Some(Screen::Splash)
            }
            MenuState::InitDefaults => {
                if now_ms.wrapping_sub(self.entered_ms) < SPLASH_MS {
                    return None
                }
                self.active_ms = now_ms;
                self.enter(MenuState::MenuDefault, now_ms);
                Some(self.settings(device))
            }
            state if input.button == Button::HoldOn && state.accepts_save() => {
                self.save_yes = false;
                self.enter(MenuState::SaveRequest, now_ms);
                Some(Screen::SaveQuestion { yes: self.save_yes })
            }
            MenuState::MenuDefault | MenuState::Settings | MenuState::SelectValues => {
                if !input.any() {
                    if self.expired(now_ms) {
                        return self.start_drawing(device, now_ms)
                    }
                    return None
                }
                self.navigate(device, input, now_ms);
                Some(self.settings(device))
            }
            MenuState::DrawSamples => {
                if input.any() {
                    self.enter(MenuState::MenuDefault, now_ms);
                    return Some(self.settings(device))
                }
                self.draw(device, now_ms)
            }
            MenuState::SaveRequest => {
                if input.button != Button::HoldOn {
                    self.enter(MenuState::SaveConfirm, now_ms);
                }
                None
            }
            MenuState::SaveConfirm => {
                if input.button == Button::Pushed {
                    if !self.save_yes {
                        return self.start_drawing(device, now_ms)
                    }
                    let ok = match device.save_config(storage) {
                        Ok(()) => true,
                        Err(error) => {
                            log::warn!("cannot save configuration: {}", error);
                            false
                        }
                    };
                    self.enter(MenuState::SaveCommit, now_ms);
                    return Some(Screen::SaveResult { ok })
                }
                match turn(&input) {
                    Some(delta) => {
                        self.save_yes = delta > 0;
                        Some(Screen::SaveQuestion { yes: self.save_yes })
                    }
                    None if self.expired(now_ms) =>
                        self.start_drawing(device, now_ms),
                    None => None,
                }
            }
            MenuState::SaveCommit => {
                if input.button == Button::Pushed {
                    self.enter(MenuState::MenuDefault, now_ms);
                    Some(self.settings(device))
                } else if self.expired(now_ms) {
                    self.start_drawing(device, now_ms)
                } else {
                    None
                }
            }
        }
    }

    fn navigate<D: Driver>(&mut self, device: &Device<D>, input: Input, now_ms: u32) {
        match self.state {
            MenuState::MenuDefault =>
                self.enter(MenuState::Settings, now_ms),
            MenuState::Settings => {
                if input.button == Button::Pushed {
                    self.enter(MenuState::SelectValues, now_ms);
                } else if let Some(delta) = turn(&input) {
                    // the list grows downwards
                    let last = Row::last(device.config().selected);
                    self.row = self.row.step(-delta, last);
                }
            }
            MenuState::SelectValues => {
                if input.button == Button::Pushed {
                    self.enter(MenuState::Settings, now_ms);
                } else if let Some(delta) = turn(&input) {
                    let row = self.row;
                    let config = device.update(|config| row.edit(config, delta));
                    log::debug!("{} = {}", row, row.value(&config));
                }
            }
            _ => (),
        }
    }

    fn start_drawing<D: Driver>(&mut self, device: &Device<D>, now_ms: u32) -> Option<Screen> {
        self.enter(MenuState::DrawSamples, now_ms);
        device.consume_frame();
        self.force_redraw = true;
        self.draw(device, now_ms)
    }

    /// Whether the display is refreshed: the frequency moved out of the match window around
    /// the last drawn value, or the display has been steady for too long.
    fn redraw_due(&self, now_ms: u32) -> bool {
        let (lower, upper) = limits(self.drawn_frequency10, MATCH_PERCENT);
        let moved = self.frequency10 > 0 && !(lower..=upper).contains(&self.frequency10);
        moved || now_ms.wrapping_sub(self.drawn_ms) > REDRAW_TIMEOUT_MS
    }

    /// One pass of the sample display: update the frequency reading, service the auto
    /// trigger watchdog and hand the capture back to the sampler. A free-running display and
    /// a completed triggered capture are consumed on every pass, but only emit a screen when
    /// a redraw is due.
    fn draw<D: Driver>(&mut self, device: &Device<D>, now_ms: u32) -> Option<Screen> {
        if let Some(count) = device.read_period() {
            self.frequency10 = period_to_frequency10(count);
        }
        if device.poll_trigger_timeout(ChannelId::A, now_ms) {
            log::trace!("no trigger, drawing flat line");
            device.mark_ready(ChannelId::A);
            self.frequency10 = 0;
            self.force_redraw = true;
        }

        let config = device.config();
        let pending = self.force_redraw || config.trigger_mode() == TriggerMode::Off ||
            config.channels[0].draw_ready;
        if !pending {
            return None
        }
        let redraw = self.force_redraw || self.redraw_due(now_ms);
        self.force_redraw = false;

        let mut frame = device.frame();
        if redraw && frame.config.option() == CaptureOption::DualAutoDetect {
            if let Some(samples) = &frame.channel_b {
                let plugged = is_plugged_in(samples);
                device.set_channel_b_status(plugged);
                frame.config.channels[1].status = plugged;
            }
        }
        device.consume_frame();
        if !redraw {
            return None
        }
        self.drawn_ms = now_ms;
        self.drawn_frequency10 = self.frequency10;

        let option = frame.config.option();
        if option.is_measurement() {
            Some(Screen::Measurement(Measurement::new(option, self.frequency10)))
        } else {
            Some(Screen::Samples(frame))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::SAMPLE_COUNT;
    use crate::persist::PersistedConfig;
    use crate::regs::analog::Comparator;
    use crate::sys::Clock;
    use crate::trigger::TriggerState;
    use crate::sys::sim::{MemoryStorage, Signal, SimClock, SimDriver};

    struct Bench {
        clock: SimClock,
        device: Device<SimDriver>,
        storage: MemoryStorage,
        menu: Menu,
    }

    impl Bench {
        fn new(signal_a: Signal, signal_b: Signal) -> Bench {
            let clock = SimClock::new();
            let driver = SimDriver::new(clock.clone(), [signal_a, signal_b]);
            Bench {
                device: Device::new(driver),
                storage: MemoryStorage::new(64),
                menu: Menu::new(clock.millis()),
                clock,
            }
        }

        /// Run through the splash screen into the idle menu.
        fn boot(mut self) -> Bench {
            assert_eq!(self.poll(idle()), Some(Screen::Splash));
            self.wait(SPLASH_MS - 1);
            assert_eq!(self.poll(idle()), None);
            self.wait(1);
            assert!(matches!(self.poll(idle()), Some(Screen::Settings { row: None, .. })));
            assert_eq!(self.menu.state(), MenuState::MenuDefault);
            self
        }

        fn poll(&mut self, input: Input) -> Option<Screen> {
            let now_ms = self.clock.millis();
            self.menu.poll(&self.device, &mut self.storage, input, now_ms)
        }

        fn poll_all(&mut self, inputs: &[Input]) -> Option<Screen> {
            inputs.iter().fold(None, |_, &input| self.poll(input))
        }

        fn wait(&mut self, ms: u32) {
            self.clock.advance_us(ms as u64 * 1000);
        }

        fn ticks(&mut self, count: usize) {
            for _ in 0..count {
                self.device.on_tick();
            }
        }

        /// Stay idle long enough for the menu to time out into the sample display.
        fn idle_until_drawing(&mut self) -> Option<Screen> {
            self.wait(MENU_TIMEOUT_MS + 1);
            let screen = self.poll(idle());
            assert_eq!(self.menu.state(), MenuState::DrawSamples);
            screen
        }
    }

    fn idle() -> Input {
        Input::default()
    }

    fn up() -> Input {
        Input { up: true, ..Input::default() }
    }

    fn down() -> Input {
        Input { down: true, ..Input::default() }
    }

    fn button(button: Button) -> Input {
        Input { button, ..Input::default() }
    }

    fn push() -> Input {
        button(Button::Pushed)
    }

    #[test]
    fn test_boot_restores_config() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0));
        let mut config = Config::default();
        config.channels[0].time_base = TimeBase::Ms2;
        config.channels[0].offset = -4;
        PersistedConfig::capture(&config).save(&mut bench.storage).unwrap();

        let bench = bench.boot();
        assert!(bench.device.config().same_persisted(&config));
    }

    #[test]
    fn test_inactivity_timeout() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        bench.wait(MENU_TIMEOUT_MS);
        assert_eq!(bench.poll(idle()), None);
        bench.wait(1);
        match bench.poll(idle()) {
            Some(Screen::Samples(frame)) =>
                assert_eq!(frame.trace_a().unwrap()[0], 63),
            screen => panic!("unexpected {:?}", screen),
        }
        assert_eq!(bench.menu.state(), MenuState::DrawSamples);

        assert!(matches!(bench.poll(up()), Some(Screen::Settings { row: None, .. })));
        assert_eq!(bench.menu.state(), MenuState::MenuDefault);
    }

    #[test]
    fn test_input_keeps_menu_open() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        bench.poll(push());
        bench.wait(MENU_TIMEOUT_MS);
        bench.poll(down());
        bench.wait(MENU_TIMEOUT_MS);
        assert_eq!(bench.poll(idle()), None);
        assert_eq!(bench.menu.state(), MenuState::Settings);
    }

    #[test]
    fn test_row_cursor() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        assert_eq!(bench.poll(push()), Some(Screen::Settings {
            config: bench.device.config(),
            row: Some(Row::Channel),
            editing: false,
        }));
        bench.poll_all(&[down(); 10]);
        assert_eq!(bench.menu.row(), Row::Option);
        bench.poll_all(&[up(); 10]);
        assert_eq!(bench.menu.row(), Row::Channel);

        // channel B has no trigger rows
        bench.poll_all(&[push(), up(), push()]);
        assert_eq!(bench.device.config().selected, ChannelId::B);
        bench.poll_all(&[down(); 10]);
        assert_eq!(bench.menu.row(), Row::Offset);
    }

    #[test]
    fn test_edit_trigger() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        bench.poll_all(&[push(), down(), down(), down(), down()]);
        assert_eq!(bench.menu.row(), Row::Trigger);
        let screen = bench.poll_all(&[push(), up()]);
        assert!(matches!(screen, Some(Screen::Settings { row: Some(Row::Trigger), editing: true, .. })));
        assert_eq!(bench.device.config().trigger_mode(), TriggerMode::AutoPositive);
        bench.device.with_driver(|driver| {
            assert!(driver.comparator().contains(Comparator::InterruptEnable));
        });

        bench.poll_all(&[up(); 10]);
        assert_eq!(bench.device.config().trigger_mode(), TriggerMode::NormalNegative);
        bench.poll(down());
        assert_eq!(bench.device.config().trigger_mode(), TriggerMode::NormalPositive);

        bench.poll(push());
        assert_eq!(bench.menu.state(), MenuState::Settings);
    }

    #[test]
    fn test_edit_offset_saturates() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        bench.poll_all(&[push(), down(), down(), down(), push()]);
        bench.poll_all(&[down(); 40]);
        assert_eq!(bench.device.config().channels[0].offset, OFFSET_MIN);
    }

    #[test]
    fn test_channel_b_time_base_follows_a() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        bench.poll_all(&[push(), push(), up(), push(), down(), down(), push()]);
        assert_eq!(bench.menu.row(), Row::TimeBase);
        bench.poll_all(&[up(); 3]);
        let config = bench.device.config();
        assert_eq!(config.channels[1].time_base, config.channels[0].time_base);
    }

    #[test]
    fn test_save_confirmed() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        let config = bench.device.update(|config| config.channels[0].offset = 5);

        assert_eq!(bench.poll(button(Button::HoldOn)), Some(Screen::SaveQuestion { yes: false }));
        assert_eq!(bench.poll(button(Button::HoldOn)), None);
        assert_eq!(bench.menu.state(), MenuState::SaveRequest);
        assert_eq!(bench.poll(button(Button::Released)), None);
        assert_eq!(bench.menu.state(), MenuState::SaveConfirm);
        assert_eq!(bench.poll(up()), Some(Screen::SaveQuestion { yes: true }));
        assert_eq!(bench.poll(push()), Some(Screen::SaveResult { ok: true }));
        assert_eq!(bench.menu.state(), MenuState::SaveCommit);

        let stored = PersistedConfig::load(&bench.storage).unwrap().unwrap();
        assert_eq!(stored, PersistedConfig::capture(&config));

        assert!(matches!(bench.poll(push()), Some(Screen::Settings { .. })));
        assert_eq!(bench.menu.state(), MenuState::MenuDefault);
    }

    #[test]
    fn test_save_declined() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        bench.poll_all(&[button(Button::HoldOn), button(Button::Released), up(), down()]);
        assert!(matches!(bench.poll(push()), Some(Screen::Samples(_))));
        assert_eq!(bench.menu.state(), MenuState::DrawSamples);
        assert_eq!(bench.storage.bytes()[0], 0xff);
    }

    #[test]
    fn test_save_failure() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0));
        bench.storage = MemoryStorage::new(4);
        let mut bench = bench.boot();
        bench.poll_all(&[button(Button::HoldOn), button(Button::Released), up()]);
        assert_eq!(bench.poll(push()), Some(Screen::SaveResult { ok: false }));
    }

    #[test]
    fn test_save_from_display() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        bench.idle_until_drawing();
        bench.poll(button(Button::HoldOn));
        assert_eq!(bench.menu.state(), MenuState::SaveRequest);
    }

    #[test]
    fn test_free_run_redraw_interval() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        assert!(bench.idle_until_drawing().is_some());
        bench.wait(REDRAW_TIMEOUT_MS / 2);
        assert_eq!(bench.poll(idle()), None);
        bench.wait(REDRAW_TIMEOUT_MS / 2);
        assert_eq!(bench.poll(idle()), None);
        bench.wait(1);
        assert!(matches!(bench.poll(idle()), Some(Screen::Samples(_))));

        // a new frequency on channel A redraws at once
        bench.device.with_driver(|driver| driver.set_signal(ChannelId::A, Signal::sine(440.0)));
        bench.wait(1);
        assert!(matches!(bench.poll(idle()), Some(Screen::Samples(_))));
        bench.wait(1);
        assert_eq!(bench.poll(idle()), None);
    }

    #[test]
    fn test_triggered_capture_consumed_without_redraw() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        bench.device.update(|config| {
            config.channels[0].trigger_mode = TriggerMode::NormalPositive;
            config.channels[0].time_base = TimeBase::Us50;
        });
        bench.idle_until_drawing();
        bench.wait(1);
        assert_eq!(bench.poll(idle()), None);

        // completed right after the last redraw: dropped, and the trigger may fire again
        bench.ticks(SAMPLE_COUNT);
        bench.wait(1);
        assert_eq!(bench.device.trigger_state(), TriggerState::Complete);
        assert_eq!(bench.poll(idle()), None);
        assert_eq!(bench.device.trigger_state(), TriggerState::Idle);

        assert!(bench.device.on_edge(bench.clock.millis()));
        bench.ticks(SAMPLE_COUNT);
        bench.wait(REDRAW_TIMEOUT_MS);
        match bench.poll(idle()) {
            Some(Screen::Samples(frame)) =>
                assert_eq!(frame.channel_a, [32; SAMPLE_COUNT]),
            screen => panic!("unexpected {:?}", screen),
        }
        bench.wait(1);
        assert_eq!(bench.poll(idle()), None);
    }

    #[test]
    fn test_watchdog_draws_flat_line() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(0)).boot();
        bench.device.update(|config| config.channels[0].trigger_mode = TriggerMode::AutoPositive);
        match bench.idle_until_drawing() {
            Some(Screen::Samples(frame)) => {
                assert!(frame.config.channels[0].draw_ready);
                assert_eq!(frame.channel_a, [31; SAMPLE_COUNT]);
            }
            screen => panic!("unexpected {:?}", screen),
        }
        assert_eq!(bench.menu.frequency10(), 0);
    }

    #[test]
    fn test_tuning_display() {
        let mut bench = Bench::new(Signal::sine(440.0), Signal::Dc(0)).boot();
        bench.device.update(|config| config.channels[0].option = CaptureOption::Tuning);
        match bench.idle_until_drawing() {
            Some(Screen::Measurement(measurement)) => {
                assert_eq!(measurement.frequency10, 4399);
                assert_eq!(measurement.reading.pitch, Pitch::Note(10));
                assert_eq!(measurement.reading.octave, 4);
                assert!(measurement.in_tune);
            }
            screen => panic!("unexpected {:?}", screen),
        }

        // steady reading is not redrawn until the refresh interval is over
        bench.wait(1);
        assert_eq!(bench.poll(idle()), None);

        bench.device.with_driver(|driver| driver.set_signal(ChannelId::A, Signal::sine(466.0)));
        bench.wait(1);
        match bench.poll(idle()) {
            Some(Screen::Measurement(measurement)) =>
                assert_eq!(measurement.reading.pitch, Pitch::Note(11)),
            screen => panic!("unexpected {:?}", screen),
        }
    }

    #[test]
    fn test_frequency_beyond_note_range() {
        let mut bench = Bench::new(Signal::sine(5_000_000.0), Signal::Dc(0)).boot();
        bench.device.update(|config| config.channels[0].option = CaptureOption::Frequency);
        match bench.idle_until_drawing() {
            Some(Screen::Measurement(measurement)) => {
                assert_eq!(measurement.frequency10, 53_333_333);
                assert_eq!(measurement.reading.pitch, Pitch::TooHigh);
                assert!(!measurement.in_tune);
            }
            screen => panic!("unexpected {:?}", screen),
        }
        bench.wait(1);
        assert_eq!(bench.poll(idle()), None);
        bench.wait(REDRAW_TIMEOUT_MS);
        assert!(matches!(bench.poll(idle()), Some(Screen::Measurement(_))));
    }

    #[test]
    fn test_plug_detection() {
        let mut bench = Bench::new(Signal::Dc(512), Signal::Dc(512)).boot();
        bench.device.update(|config| config.channels[0].option = CaptureOption::DualAutoDetect);
        match bench.idle_until_drawing() {
            Some(Screen::Samples(frame)) => assert!(!frame.shows_channel_b()),
            screen => panic!("unexpected {:?}", screen),
        }

        bench.ticks(SAMPLE_COUNT * 10 + 10);
        bench.wait(REDRAW_TIMEOUT_MS + 1);
        match bench.poll(idle()) {
            Some(Screen::Samples(frame)) => assert!(frame.shows_channel_b()),
            screen => panic!("unexpected {:?}", screen),
        }
        assert!(bench.device.config().channels[1].status);
    }

    #[test]
    fn test_measurement_labels() {
        let measurement = Measurement::new(CaptureOption::Frequency, 0);
        assert_eq!(measurement.reading.pitch, Pitch::Unmatched);
        assert!(!measurement.in_tune);
        assert_eq!(Row::Offset.value(&Config::default()), "0");
        assert_eq!(Row::TimeBase.to_string(), "Time/div");
    }
}
