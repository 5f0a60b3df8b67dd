use std::{env, fmt::Display, str::FromStr};

use log::*;
use mkt_common::helpers::{parse_boolean_flag, parse_list};

use crate::{errors::ConfigError, events::ChannelId, notifications::DEFAULT_FEED_CAPACITY};

const DEFAULT_EVENT_BUFFER_SIZE: usize = 128;
const DEFAULT_HOOK_BUFFER_SIZE: usize = 16;
const DEFAULT_REFRESH_ON_ATTACH: bool = true;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Maximum number of entries kept in the notification feed.
    pub feed_capacity: usize,
    /// Capacity of the queue between the push transports and the dispatch loop.
    pub event_buffer_size: usize,
    /// Capacity of the queue in front of each host hook.
    pub hook_buffer_size: usize,
    /// Channels to connect when the engine starts.
    pub channels: Vec<ChannelId>,
    /// Refresh the shop status as soon as the orchestrator attaches.
    pub refresh_on_attach: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            feed_capacity: DEFAULT_FEED_CAPACITY,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            hook_buffer_size: DEFAULT_HOOK_BUFFER_SIZE,
            channels: ChannelId::ALL.to_vec(),
            refresh_on_attach: DEFAULT_REFRESH_ON_ATTACH,
        }
    }
}

impl SyncConfig {
    /// Reads the configuration from `MKT_*` environment variables. Anything missing or invalid falls back to the
    /// default, with a log message for the invalid ones.
    pub fn from_env_or_default() -> Self {
        Self::from_lookup_or_default(|name| env::var(name).ok())
    }

    /// Reads the configuration from `MKT_*` environment variables, failing on the first invalid value.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::try_from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup_or_default<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let defaults = Self::default();
        let feed_capacity = parse_size(&lookup, "MKT_FEED_CAPACITY").unwrap_or_else(|e| {
            warn!("🪛️ {e} Using the default, {}, instead.", defaults.feed_capacity);
            None
        });
        let event_buffer_size = parse_size(&lookup, "MKT_EVENT_BUFFER_SIZE").unwrap_or_else(|e| {
            warn!("🪛️ {e} Using the default, {}, instead.", defaults.event_buffer_size);
            None
        });
        let hook_buffer_size = parse_size(&lookup, "MKT_HOOK_BUFFER_SIZE").unwrap_or_else(|e| {
            warn!("🪛️ {e} Using the default, {}, instead.", defaults.hook_buffer_size);
            None
        });
        let channels = parse_channels(&lookup).unwrap_or_else(|e| {
            warn!("🪛️ {e} Connecting to all channels instead.");
            None
        });
        let refresh_on_attach = parse_boolean_flag(lookup("MKT_REFRESH_ON_ATTACH"), DEFAULT_REFRESH_ON_ATTACH);
        Self {
            feed_capacity: feed_capacity.unwrap_or(defaults.feed_capacity),
            event_buffer_size: event_buffer_size.unwrap_or(defaults.event_buffer_size),
            hook_buffer_size: hook_buffer_size.unwrap_or(defaults.hook_buffer_size),
            channels: channels.unwrap_or(defaults.channels),
            refresh_on_attach,
        }
    }

    pub fn try_from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where F: Fn(&str) -> Option<String> {
        let defaults = Self::default();
        Ok(Self {
            feed_capacity: parse_size(&lookup, "MKT_FEED_CAPACITY")?.unwrap_or(defaults.feed_capacity),
            event_buffer_size: parse_size(&lookup, "MKT_EVENT_BUFFER_SIZE")?.unwrap_or(defaults.event_buffer_size),
            hook_buffer_size: parse_size(&lookup, "MKT_HOOK_BUFFER_SIZE")?.unwrap_or(defaults.hook_buffer_size),
            channels: parse_channels(&lookup)?.unwrap_or(defaults.channels),
            refresh_on_attach: parse_boolean_flag(lookup("MKT_REFRESH_ON_ATTACH"), DEFAULT_REFRESH_ON_ATTACH),
        })
    }
}

fn invalid<E: Display>(name: &'static str, value: &str, e: E) -> ConfigError {
    ConfigError::InvalidValue { name, value: value.to_string(), reason: e.to_string() }
}

/// Sizes must be positive. `Ok(None)` means the variable is not set.
fn parse_size<F>(lookup: &F, name: &'static str) -> Result<Option<usize>, ConfigError>
where F: Fn(&str) -> Option<String> {
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    match usize::from_str(value.trim()) {
        Ok(0) => Err(invalid(name, &value, "It must be greater than zero.")),
        Ok(n) => Ok(Some(n)),
        Err(e) => Err(invalid(name, &value, e)),
    }
}

fn parse_channels<F>(lookup: &F) -> Result<Option<Vec<ChannelId>>, ConfigError>
where F: Fn(&str) -> Option<String> {
    let Some(value) = lookup("MKT_PUSH_CHANNELS") else {
        return Ok(None);
    };
    let mut channels = Vec::new();
    for name in parse_list(&value) {
        let channel = name.parse::<ChannelId>().map_err(|e| invalid("MKT_PUSH_CHANNELS", &value, e))?;
        if !channels.contains(&channel) {
            channels.push(channel);
        }
    }
    Ok(Some(channels))
}
