//! Checksum-guarded storage of the user configuration.

use bytemuck::{Pod, Zeroable};

use crate::{Error, Result};
use crate::config::{
    Amplification, CaptureOption, ChannelId, Config, TimeBase, TriggerLevel, TriggerMode,
    OFFSET_MAX, OFFSET_MIN,
};
use crate::sys::Storage;

pub const ADDR_CHECKSUM: usize = 0;
pub const ADDR_CONFIG_BASE: usize = 2;

/// The persisted subset of `Config`, one byte per field holding the menu code of each setting.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct PersistedConfig {
    pub a_amplification: u8,
    pub a_time_base: u8,
    pub a_trigger_mode: u8,
    pub a_offset: i8,
    pub a_option: u8,
    pub a_trigger_level: u8,
    pub b_amplification: u8,
    pub b_time_base: u8,
    pub b_offset: i8,
}

/// XOR of all bytes.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |checksum, &byte| checksum ^ byte)
}

fn decode_offset(offset: i8) -> Option<i8> {
    Some(offset).filter(|offset| (OFFSET_MIN..=OFFSET_MAX).contains(offset))
}

fn decode_amplification(code: u8, channel: ChannelId) -> Option<Amplification> {
    Amplification::from_code(code).filter(|&amplification| amplification <= Amplification::max(channel))
}

impl PersistedConfig {
    pub fn capture(config: &Config) -> PersistedConfig {
        let [a, b] = &config.channels;
        PersistedConfig {
            a_amplification: a.amplification.code(),
            a_time_base:     a.time_base.code(),
            a_trigger_mode:  a.trigger_mode.code(),
            a_offset:        a.offset,
            a_option:        a.option.code(),
            a_trigger_level: a.trigger_level.code(),
            b_amplification: b.amplification.code(),
            b_time_base:     b.time_base.code(),
            b_offset:        b.offset,
        }
    }

    /// Decode onto `base`, keeping its transient fields. Returns `None` if any field holds
    /// a value no menu can produce.
    pub fn apply(&self, base: &Config) -> Option<Config> {
        let mut config = *base;
        let [a, b] = &mut config.channels;
        a.amplification = decode_amplification(self.a_amplification, ChannelId::A)?;
        a.time_base     = TimeBase::from_code(self.a_time_base)?;
        a.trigger_mode  = TriggerMode::from_code(self.a_trigger_mode)?;
        a.offset        = decode_offset(self.a_offset)?;
        a.option        = CaptureOption::from_code(self.a_option)?;
        a.trigger_level = TriggerLevel::from_code(self.a_trigger_level)?;
        b.amplification = decode_amplification(self.b_amplification, ChannelId::B)?;
        b.time_base     = TimeBase::from_code(self.b_time_base)?;
        b.offset        = decode_offset(self.b_offset)?;
        Some(config)
    }

    pub fn checksum(&self) -> u8 {
        checksum(bytemuck::bytes_of(self))
    }

    /// Write the block and its checksum, then read the block back to verify it.
    pub fn save<S: Storage>(&self, storage: &mut S) -> Result<()> {
        let expected = self.checksum();
        storage.write(ADDR_CONFIG_BASE, bytemuck::bytes_of(self))?;
        storage.write(ADDR_CHECKSUM, &[expected])?;

        let mut stored = [0u8];
        storage.read(ADDR_CHECKSUM, &mut stored)?;
        let actual = Self::read_block(storage)?.checksum();
        if actual != expected || stored[0] != expected {
            return Err(Error::Verify { expected, actual })
        }
        log::info!("saved configuration, checksum {:#04x}", expected);
        Ok(())
    }

    /// Read the block if its checksum matches. Field values are not validated.
    pub fn load<S: Storage>(storage: &S) -> Result<Option<PersistedConfig>> {
        let mut stored = [0u8];
        storage.read(ADDR_CHECKSUM, &mut stored)?;
        let block = Self::read_block(storage)?;
        if block.checksum() != stored[0] {
            log::warn!("stored configuration checksum {:#04x} does not match {:#04x}",
                stored[0], block.checksum());
            return Ok(None)
        }
        Ok(Some(block))
    }

    fn read_block<S: Storage>(storage: &S) -> Result<PersistedConfig> {
        let mut block = PersistedConfig::zeroed();
        storage.read(ADDR_CONFIG_BASE, bytemuck::bytes_of_mut(&mut block))?;
        Ok(block)
    }
}

/// Configuration to boot with: the stored one if intact, `defaults` otherwise.
pub(crate) fn restore<S: Storage>(storage: &S, defaults: &Config) -> Config {
    match PersistedConfig::load(storage) {
        Ok(Some(block)) => match block.apply(defaults) {
            Some(config) => {
                log::debug!("restored configuration {:?}", block);
                config
            }
            None => {
                log::warn!("stored configuration {:?} is invalid, using defaults", block);
                *defaults
            }
        }
        Ok(None) =>
            *defaults,
        Err(error) => {
            log::warn!("cannot read stored configuration: {}", error);
            *defaults
        }
    }
}
