use {
    crate::RetryPolicy,
    std::{
        fmt::{self, Display, Formatter},
        time::Duration,
    },
    url::Url,
};

/// Command line arguments for the relayer client.
#[derive(clap::Parser, Debug, Clone)]
#[group(skip)]
pub struct Arguments {
    /// Base URL of the Standard Relayer API v2 endpoints.
    #[clap(long, env, default_value = "http://localhost:3300/v2/")]
    pub relayer_url: Url,

    /// Timeout for a single http request to the relayer.
    #[clap(
        long,
        env,
        default_value = "10s",
        value_parser = humantime::parse_duration,
    )]
    pub http_timeout: Duration,

    /// How often a request is attempted in total when the relayer is
    /// unavailable. Rejections are never retried.
    #[clap(long, env, default_value = "3")]
    pub relayer_attempts: u32,

    /// Delay before the first retry. Doubles with every further attempt.
    #[clap(
        long,
        env,
        default_value = "500ms",
        value_parser = humantime::parse_duration,
    )]
    pub relayer_retry_delay: Duration,
}

impl Arguments {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.relayer_attempts.max(1),
            base_delay: self.relayer_retry_delay,
        }
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self {
            relayer_url,
            http_timeout,
            relayer_attempts,
            relayer_retry_delay,
        } = self;

        writeln!(f, "relayer_url: {relayer_url}")?;
        writeln!(f, "http_timeout: {http_timeout:?}")?;
        writeln!(f, "relayer_attempts: {relayer_attempts}")?;
        writeln!(f, "relayer_retry_delay: {relayer_retry_delay:?}")
    }
}
