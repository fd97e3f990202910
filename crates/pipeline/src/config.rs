use std::time::Duration;

use vault_core::waveform::DEFAULT_BARS;

const DEFAULT_WORKERS: usize = 2;
const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Worker pool settings.
#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    /// Number of worker tasks.
    pub workers: usize,
    /// Jobs that may wait before `queue_job` blocks.
    pub queue_capacity: usize,
    /// Bars per generated waveform.
    pub waveform_bars: usize,
    /// Kill an encode that runs longer than this. `None` waits forever.
    pub encode_timeout: Option<Duration>,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            waveform_bars: DEFAULT_BARS,
            encode_timeout: None,
        }
    }
}

impl TranscoderConfig {
    /// Load from environment variables, falling back to defaults for
    /// anything missing or unparseable.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `TRANSCODE_WORKERS`        | `2`     |
    /// | `TRANSCODE_QUEUE_CAPACITY` | `100`   |
    /// | `WAVEFORM_BARS`            | `200`   |
    /// | `TRANSCODE_TIMEOUT_SECS`   | unset   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let workers = env_parse("TRANSCODE_WORKERS")
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.workers);

        let queue_capacity = env_parse("TRANSCODE_QUEUE_CAPACITY")
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.queue_capacity);

        let waveform_bars = env_parse("WAVEFORM_BARS")
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.waveform_bars);

        let encode_timeout = env_parse::<u64>("TRANSCODE_TIMEOUT_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            workers,
            queue_capacity,
            waveform_bars,
            encode_timeout,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
