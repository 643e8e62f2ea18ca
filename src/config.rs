//! Engine configuration: worker-pool sizing and channel byte order.
//!
//! Both settings can be taken from the environment:
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `PIXELWORKS_THREADS` | positive integer | `max((cores + 1) / 2, 4)` |
//! | `PIXELWORKS_CHANNEL_ORDER` | `rgba`, `bgra` | `rgba` |
//!
//! The channel order is the process-wide default for flat streams
//! ([`RasterBuffer::from_stream`](crate::raster::RasterBuffer::from_stream) and
//! [`to_stream`](crate::raster::RasterBuffer::to_stream)); [`set_channel_order`]
//! or [`crate::parallel::configure`] replace it at runtime.

use std::env;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;
use std::thread;

use tracing::warn;

use crate::error::{FilterError, FilterResult};

/// Environment variable overriding the worker count.
pub const THREADS_ENV: &str = "PIXELWORKS_THREADS";

/// Environment variable selecting the byte order of flat pixel streams.
pub const CHANNEL_ORDER_ENV: &str = "PIXELWORKS_CHANNEL_ORDER";

/// Lower bound on the default worker count.
pub const MIN_WORKER_THREADS: usize = 4;

/// Byte order of a flat 4-bytes-per-pixel stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// R, G, B, A
    #[default]
    Rgba,
    /// B, G, R, A
    Bgra,
}

impl ChannelOrder {
    /// Parse `rgba` / `bgra` (case-insensitive).
    pub fn parse(value: &str) -> FilterResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rgba" => Ok(ChannelOrder::Rgba),
            "bgra" => Ok(ChannelOrder::Bgra),
            other => Err(FilterError::InvalidParameter(format!(
                "channel order must be 'rgba' or 'bgra', got '{other}'"
            ))),
        }
    }
}

/// Default worker count: half the hardware threads (rounded up), at least [`MIN_WORKER_THREADS`].
pub fn default_worker_threads() -> usize {
    let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    ((cores + 1) / 2).max(MIN_WORKER_THREADS)
}

/// Settings consumed by the executor and the import/export helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub worker_threads: usize,
    pub channel_order: ChannelOrder,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            channel_order: ChannelOrder::default(),
        }
    }
}

impl EngineConfig {
    /// Build a config from `PIXELWORKS_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> FilterResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> FilterResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(THREADS_ENV) {
            config.worker_threads = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(FilterError::InvalidParameter(format!(
                        "{THREADS_ENV} must be a positive integer, got '{raw}'"
                    )))
                }
            };
        }

        if let Some(raw) = lookup(CHANNEL_ORDER_ENV) {
            config.channel_order = ChannelOrder::parse(&raw)?;
        }

        Ok(config)
    }
}

// ============================================================================
// Process-wide settings
// ============================================================================

static ENV_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Environment configuration, read once. Invalid variables fall back to defaults.
pub(crate) fn env_config() -> &'static EngineConfig {
    ENV_CONFIG.get_or_init(|| {
        EngineConfig::from_env().unwrap_or_else(|err| {
            warn!(%err, "ignoring environment configuration");
            EngineConfig::default()
        })
    })
}

const ORDER_UNSET: u8 = u8::MAX;

static STREAM_ORDER: AtomicU8 = AtomicU8::new(ORDER_UNSET);

impl ChannelOrder {
    fn to_tag(self) -> u8 {
        match self {
            ChannelOrder::Rgba => 0,
            ChannelOrder::Bgra => 1,
        }
    }

    fn from_tag(tag: u8) -> Self {
        if tag == 1 {
            ChannelOrder::Bgra
        } else {
            ChannelOrder::Rgba
        }
    }
}

/// Byte order used for flat streams when the caller does not name one.
///
/// Starts as `PIXELWORKS_CHANNEL_ORDER` (or RGBA) until [`set_channel_order`] changes it.
pub fn channel_order() -> ChannelOrder {
    match STREAM_ORDER.load(Ordering::Acquire) {
        ORDER_UNSET => {
            let order = env_config().channel_order;
            // a concurrent setter wins over the environment value
            let _ = STREAM_ORDER.compare_exchange(
                ORDER_UNSET,
                order.to_tag(),
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            ChannelOrder::from_tag(STREAM_ORDER.load(Ordering::Acquire))
        }
        tag => ChannelOrder::from_tag(tag),
    }
}

/// Change the process-wide stream byte order.
pub fn set_channel_order(order: ChannelOrder) {
    STREAM_ORDER.store(order.to_tag(), Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_floor() {
        assert!(default_worker_threads() >= MIN_WORKER_THREADS);
        assert_eq!(EngineConfig::default().channel_order, ChannelOrder::Rgba);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config =
            EngineConfig::from_lookup(lookup_from(&[(THREADS_ENV, "2"), (CHANNEL_ORDER_ENV, "BGRA")]))
                .unwrap();
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.channel_order, ChannelOrder::Bgra);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(EngineConfig::from_lookup(lookup_from(&[(THREADS_ENV, "0")])).is_err());
        assert!(EngineConfig::from_lookup(lookup_from(&[(THREADS_ENV, "many")])).is_err());
        assert!(EngineConfig::from_lookup(lookup_from(&[(CHANNEL_ORDER_ENV, "argb")])).is_err());
    }

    #[test]
    fn test_unset_keeps_defaults() {
        let config = EngineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
