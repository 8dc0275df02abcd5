use duoscope::{Button, Device, Frame, Input, Menu, Row, Screen, Error, CaptureOption, TICK_PERIOD_US};
use duoscope::sys::Clock;
use duoscope::sys::sim::{MemoryStorage, Signal, SimClock, SimDriver};

const TICKS_PER_MS: u32 = 1000 / TICK_PERIOD_US;
const RUN_MS: u32 = 18_000;
/// Sample and measurement screens are printed at most this often.
const PRINT_INTERVAL_MS: u32 = 1000;

const PLOT_COLUMNS: usize = 64;
const PLOT_ROWS: usize = 16;

fn input(up: bool, down: bool, button: Button) -> Input {
    Input { up, down, button }
}

/// Encoder session replayed against the menu: arm the auto trigger, save the configuration
/// with a long press, then switch to the tuning display.
fn script() -> Vec<(u32, Input)> {
    let push = input(false, false, Button::Pushed);
    let up = input(true, false, Button::Open);
    let down = input(false, true, Button::Open);

    let mut events = vec![
        (3500, push),
        (3600, down), (3700, down), (3800, down), (3900, down),
        (4000, push),
        (4100, up),
        (4200, push),
    ];
    events.extend((10_000..10_010).map(|ms| (ms, input(false, false, Button::HoldOn))));
    events.extend([
        (10_010, input(false, false, Button::Released)),
        (10_100, up),
        (10_200, push),
        (10_300, push),
        (10_400, push),
        (10_500, down), (10_600, down),
        (10_700, push),
        (10_800, up), (10_900, up), (11_000, up), (11_100, up),
        (11_200, push),
    ]);
    events
}

fn plot(frame: &Frame) -> String {
    let mut canvas = [[' '; PLOT_COLUMNS]; PLOT_ROWS];
    let traces = [(frame.trace_a(), '*'), (frame.trace_b(), '+')];
    for (trace, mark) in traces {
        let Some(trace) = trace else { continue };
        for (column, &y) in trace.iter().step_by(trace.len() / PLOT_COLUMNS).enumerate() {
            let row = y.clamp(0, 63) as usize * PLOT_ROWS / 64;
            canvas[row][column] = mark;
        }
    }
    let mut output = String::new();
    for row in canvas {
        output.push('|');
        output.extend(row);
        output.push_str("|\n");
    }
    output
}

fn render(screen: &Screen) -> String {
    match screen {
        Screen::Splash =>
            format!("duoscope {}\n", env!("CARGO_PKG_VERSION")),
        Screen::Settings { config, row: cursor, editing } => {
            let mut output = String::new();
            for &row in Row::ALL.iter().filter(|&&row| row <= Row::last(config.selected)) {
                let marker = match cursor {
                    Some(cursor) if *cursor == row && *editing => '*',
                    Some(cursor) if *cursor == row => '>',
                    _ => ' ',
                };
                output += &format!("{} {:<9}{}\n", marker, row.label(), row.value(config));
            }
            output
        }
        Screen::Samples(frame) =>
            format!("{} {}\n{}", frame.config.trigger_mode(), frame.config.channels[0].time_base,
                plot(frame)),
        Screen::Measurement(measurement) => {
            let hertz = format!("{}.{} Hz", measurement.frequency10 / 10, measurement.frequency10 % 10);
            match measurement.option {
                CaptureOption::Tuning =>
                    format!("{} {} {} {}\n", hertz, measurement.reading, measurement.deviation,
                        if measurement.in_tune { "in tune" } else { "" }),
                _ => format!("{}\n", hertz),
            }
        }
        Screen::SaveQuestion { yes } =>
            format!("Save settings? {}\n", if *yes { "[yes] no" } else { "yes [no]" }),
        Screen::SaveResult { ok } =>
            format!("Save {}\n", if *ok { "OK" } else { "FAILED" }),
    }
}

fn main() -> duoscope::Result<()> {
    env_logger::init();

    let frequency = std::env::args().nth(1)
        .map(|arg| arg.parse::<f64>())
        .transpose()
        .map_err(|error| Error::Other(Box::new(error)))?
        .unwrap_or(440.0);

    let clock = SimClock::new();
    let signals = [
        Signal::sine(frequency),
        Signal::Square { frequency: frequency / 2.0, low: 200, high: 800 },
    ];
    let device = Device::new(SimDriver::new(clock.clone(), signals));
    let mut storage = MemoryStorage::new(64);
    let mut menu = Menu::new(clock.millis());

    let mut events = script().into_iter().peekable();
    let mut printed_ms = None;
    while clock.millis() < RUN_MS {
        for _ in 0..TICKS_PER_MS {
            device.on_tick();
            if device.with_driver(|driver| driver.poll_comparator()) {
                device.on_edge(clock.millis());
            }
            clock.advance_us(TICK_PERIOD_US as u64);
        }

        let now_ms = clock.millis();
        let input = events.next_if(|&(at_ms, _)| at_ms <= now_ms)
            .map(|(_, input)| input)
            .unwrap_or_default();
        let Some(screen) = menu.poll(&device, &mut storage, input, now_ms) else { continue };

        if matches!(screen, Screen::Samples(_) | Screen::Measurement(_)) {
            if printed_ms.is_some_and(|printed_ms: u32| now_ms.wrapping_sub(printed_ms) < PRINT_INTERVAL_MS) {
                continue
            }
            printed_ms = Some(now_ms);
        }
        println!("--- {:>5} ms, {:?}", now_ms, menu.state());
        print!("{}", render(&screen));
    }

    println!("stored configuration: {:02x?}", &storage.bytes()[..11]);
    Ok(())
}
