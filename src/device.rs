use core::cell::RefCell;

use critical_section::Mutex;

use crate::Result;
use crate::buffer::SAMPLE_COUNT;
use crate::config::{ChannelId, Config, TriggerMode};
use crate::params::{DeviceParameters, TICK_COMPARE};
use crate::sampler::{self, Acquisition};
use crate::trigger::{self, TriggerState};
use crate::frame::Frame;
use crate::persist::{self, PersistedConfig};
use crate::sys::{Driver, Storage};

/// Owner of the state shared between the sampling and comparator interrupts and the main loop.
///
/// `on_tick` and `on_edge` are the interrupt entry points. Every other method is called from
/// the main loop; all of them lock the shared state inside a critical section, so an interrupt
/// never observes a half-applied configuration change.
pub struct Device<D: Driver> {
    acquisition: Mutex<RefCell<Acquisition>>,
    driver: Mutex<RefCell<D>>,
}

impl<D: Driver> Device<D> {
    pub fn new(driver: D) -> Device<D> {
        Device {
            acquisition: Mutex::new(RefCell::new(Acquisition::new(Config::default()))),
            driver: Mutex::new(RefCell::new(driver)),
        }
    }

    /// Program the tick timer, apply `config` to the hardware and start the trigger watchdog
    /// at `now_ms`.
    pub fn startup(&self, config: Config, now_ms: u32) -> Config {
        critical_section::with(|cs| {
            let mut acquisition = self.acquisition.borrow_ref_mut(cs);
            let mut driver = self.driver.borrow_ref_mut(cs);
            driver.configure_tick(TICK_COMPARE);
            let previous = *acquisition.config();
            *acquisition.config_mut() = config;
            acquisition.last_edge_ms = now_ms;
            Self::apply(&mut acquisition, &mut *driver, &previous, true)
        })
    }

    /// Start up with the configuration in `storage`, or the defaults if it is missing or corrupt.
    pub fn restore<S: Storage>(&self, storage: &S, now_ms: u32) -> Config {
        let config = persist::restore(storage, &Config::default());
        self.startup(config, now_ms)
    }

    /// Sampling timer interrupt.
    pub fn on_tick(&self) {
        critical_section::with(|cs| {
            let mut acquisition = self.acquisition.borrow_ref_mut(cs);
            let mut driver = self.driver.borrow_ref_mut(cs);
            sampler::tick(&mut acquisition, &mut *driver);
        })
    }

    /// Analog comparator interrupt. Returns `true` if the edge started a capture.
    pub fn on_edge(&self, now_ms: u32) -> bool {
        critical_section::with(|cs| {
            trigger::on_edge(&mut self.acquisition.borrow_ref_mut(cs), now_ms)
        })
    }

    /// Apply `edit` to the configuration and propagate it to the sampler and the hardware.
    /// Returns the configuration as applied, after cross-field constraints.
    pub fn update<F: FnOnce(&mut Config)>(&self, edit: F) -> Config {
        critical_section::with(|cs| {
            let mut acquisition = self.acquisition.borrow_ref_mut(cs);
            let mut driver = self.driver.borrow_ref_mut(cs);
            let previous = *acquisition.config();
            edit(acquisition.config_mut());
            Self::apply(&mut acquisition, &mut *driver, &previous, false)
        })
    }

    fn apply(acquisition: &mut Acquisition, driver: &mut D, previous: &Config, startup: bool)
            -> Config {
        let config = acquisition.config_mut();
        if config.enforce_time_base_order() {
            log::debug!("channel 2 time base limited to {}", config.channels[1].time_base);
        }
        if startup || config.option() != previous.option() {
            config.sync_channel_b_status();
        }
        if config.trigger_mode() == TriggerMode::Off {
            config.channels[0].draw_ready = true;
            config.channels[1].draw_ready = config.channels[1].status;
        }
        let config = *config;

        // an unrelated edit keeps the decimation phase
        for channel in ChannelId::ALL {
            if startup || config.channel(channel).time_base != previous.channel(channel).time_base {
                acquisition.reseed_channel(channel);
            }
        }
        if config.option().uses_channel_b() {
            acquisition.allocate_channel_b();
        } else {
            acquisition.release_channel_b();
        }

        let params = DeviceParameters::derive(&config);
        log::debug!("applying {:?}", params);
        driver.write_comparator(params.comparator);
        for channel in ChannelId::ALL {
            driver.write_frontend(channel, params.frontends[channel.index()]);
        }
        config
    }

    pub fn config(&self) -> Config {
        critical_section::with(|cs| *self.acquisition.borrow_ref(cs).config())
    }

    pub fn trigger_state(&self) -> TriggerState {
        critical_section::with(|cs| TriggerState::of(&self.acquisition.borrow_ref(cs)))
    }

    /// Check the auto trigger watchdog of `channel`. On timeout the buffer holds a flat line.
    pub fn poll_trigger_timeout(&self, channel: ChannelId, now_ms: u32) -> bool {
        critical_section::with(|cs| {
            trigger::check_timeout(&mut self.acquisition.borrow_ref_mut(cs), channel, now_ms)
        })
    }

    pub fn mark_ready(&self, channel: ChannelId) {
        critical_section::with(|cs| {
            let mut acquisition = self.acquisition.borrow_ref_mut(cs);
            acquisition.config_mut().channel_mut(channel).draw_ready = true;
        })
    }

    /// Copy both buffers and the configuration at one instant.
    pub fn frame(&self) -> Frame {
        critical_section::with(|cs| {
            let acquisition = self.acquisition.borrow_ref(cs);
            let samples = |channel: ChannelId| acquisition.buffer(channel).map(|buffer| *buffer.data());
            Frame {
                config: *acquisition.config(),
                channel_a: samples(ChannelId::A).unwrap_or([0; SAMPLE_COUNT]),
                channel_b: samples(ChannelId::B),
            }
        })
    }

    /// Hand the buffers back to the sampler once drawn. A free-running channel A keeps
    /// sampling; a triggered one waits for the next edge.
    pub fn consume_frame(&self) {
        critical_section::with(|cs| {
            let mut acquisition = self.acquisition.borrow_ref_mut(cs);
            let config = acquisition.config_mut();
            let [a, b] = &mut config.channels;
            if a.trigger_mode == TriggerMode::Off {
                a.draw_ready = true;
                a.armed = true;
            } else {
                a.draw_ready = false;
            }
            if !b.status {
                b.armed = false;
            }
            b.draw_ready = false;
        })
    }

    /// Show or hide channel B without touching its buffer, for plug detection.
    pub fn set_channel_b_status(&self, status: bool) {
        critical_section::with(|cs| {
            let mut acquisition = self.acquisition.borrow_ref_mut(cs);
            let channel_b = acquisition.config_mut().channel_mut(ChannelId::B);
            if channel_b.status != status {
                log::debug!("channel 2 {}", if status { "plugged in" } else { "unplugged" });
                channel_b.status = status;
            }
        })
    }

    pub fn save_config<S: Storage>(&self, storage: &mut S) -> Result<()> {
        PersistedConfig::capture(&self.config()).save(storage)
    }

    /// Signal period of channel A measured by the input capture unit, in CPU cycles.
    pub fn read_period(&self) -> Option<u32> {
        self.with_driver(|driver| driver.read_period())
    }

    pub fn with_driver<R, F: FnOnce(&mut D) -> R>(&self, f: F) -> R {
        critical_section::with(|cs| f(&mut self.driver.borrow_ref_mut(cs)))
    }
}
