use tracing::Level;

/// How log events are filtered and where they are written.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directives in the `EnvFilter` syntax, e.g. `warn,maker=debug`.
    pub(crate) env_filter: String,
    /// Events at or above this level go to stderr, the rest to stdout.
    /// Defaults to `ERROR`.
    pub(crate) stderr_threshold: Option<Level>,
    pub(crate) use_json_format: bool,
}

impl Config {
    pub fn new(env_filter: &str, stderr_threshold: Option<Level>, use_json_format: bool) -> Self {
        Self {
            env_filter: env_filter.to_owned(),
            stderr_threshold,
            use_json_format,
        }
    }

    pub fn with_json_format(self) -> Self {
        Self {
            use_json_format: true,
            ..self
        }
    }

    pub fn with_env_filter(self, env_filter: &str) -> Self {
        Self {
            env_filter: env_filter.to_owned(),
            ..self
        }
    }

    pub fn with_stderr_threshold(self, level: Level) -> Self {
        Self {
            stderr_threshold: Some(level),
            ..self
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("info", None, false)
    }
}
