use vault_pipeline::TranscoderConfig;

/// Worker process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub transcoder: TranscoderConfig,
    /// Requeue lossy encodes left unfinished by a previous run.
    pub reconcile_on_startup: bool,
    /// Emit JSON log lines instead of human-readable text.
    pub json_logs: bool,
}

impl WorkerConfig {
    /// Load configuration from the environment.
    ///
    /// | Env Var                          | Default    |
    /// |----------------------------------|------------|
    /// | `DATABASE_URL`                   | (required) |
    /// | `TRANSCODE_RECONCILE_ON_STARTUP` | `true`     |
    /// | `LOG_FORMAT`                     | `text`     |
    ///
    /// Pool settings come from [`TranscoderConfig::from_env`].
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let database_url = std::env::var("DATABASE_URL")?;

        let reconcile_on_startup = std::env::var("TRANSCODE_RECONCILE_ON_STARTUP")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(true);

        let json_logs = std::env::var("LOG_FORMAT")
            .map(|v| v.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            transcoder: TranscoderConfig::from_env(),
            reconcile_on_startup,
            json_logs,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_boolean_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
