use {
    crate::confirmation::Confirmation,
    alloy::primitives::Address,
    contracts::Network,
    model::signature::EcdsaSigningScheme,
    std::{
        fmt::{self, Display, Formatter},
        time::Duration,
    },
    url::Url,
};

/// Mnemonic of the accounts funded by the 0x development snapshot.
const DEVELOPMENT_MNEMONIC: &str =
    "concert load couple harbor equip island argue ramp clarify fence smart topic";

#[derive(clap::Parser, Debug, Clone)]
pub struct Arguments {
    /// Network to trade on, by name or network id.
    #[clap(long, env, default_value = "ganache")]
    pub network: Network,

    /// Overrides the network's default Ethereum node.
    #[clap(long, env)]
    pub node_url: Option<Url>,

    /// Mnemonic the maker and taker keys are derived from.
    #[clap(long, env, default_value = DEVELOPMENT_MNEMONIC)]
    pub mnemonic: String,

    /// Derivation index of the maker account.
    #[clap(long, env, default_value = "0")]
    pub maker_account_index: u32,

    /// Derivation index of the taker account.
    #[clap(long, env, default_value = "1")]
    pub taker_account_index: u32,

    #[clap(flatten)]
    pub relayer: relayer::Arguments,

    /// Token the maker sells. Defaults to the network's ZRX token.
    #[clap(long, env)]
    pub maker_token: Option<Address>,

    /// Amount of the maker token offered, in token units.
    #[clap(long, env, default_value = "5")]
    pub maker_amount: String,

    /// Amount of WETH asked for, in token units.
    #[clap(long, env, default_value = "0.1")]
    pub taker_amount: String,

    /// Decimals of the maker token.
    #[clap(long, env, default_value = "18")]
    pub maker_token_decimals: u8,

    /// How long the order stays valid.
    #[clap(
        long,
        env,
        default_value = "10m",
        value_parser = humantime::parse_duration,
    )]
    pub order_validity: Duration,

    /// How the order hash gets signed: `ethsign` or `eip712`.
    #[clap(long, env, default_value = "ethsign")]
    pub signing_scheme: EcdsaSigningScheme,

    /// Maximum time to wait for a setup transaction to be mined.
    #[clap(
        long,
        env,
        default_value = "2m",
        value_parser = humantime::parse_duration,
    )]
    pub confirmation_timeout: Duration,

    #[clap(
        long,
        env,
        default_value = "1s",
        value_parser = humantime::parse_duration,
    )]
    pub confirmation_poll_interval: Duration,

    /// Only print the orderbook instead of creating an order first.
    #[clap(long, env)]
    pub orderbook_only: bool,

    /// The log filter.
    #[clap(long, env, default_value = "warn,maker=debug,relayer=debug")]
    pub log: String,

    /// At which log level logs should be printed to stderr instead of stdout.
    #[clap(long, env)]
    pub stderr_threshold: Option<tracing::Level>,

    /// Whether to use JSON format for the logs.
    #[clap(long, env, default_value = "false")]
    pub use_json_logs: bool,
}

impl Arguments {
    pub fn node_url(&self) -> Url {
        self.node_url
            .clone()
            .unwrap_or_else(|| self.network.rpc_url())
    }

    pub fn maker_token(&self) -> Address {
        self.maker_token
            .unwrap_or(self.network.addresses.zrx_token)
    }

    pub fn confirmation(&self) -> Confirmation {
        Confirmation {
            timeout: self.confirmation_timeout,
            poll_interval: self.confirmation_poll_interval,
        }
    }

    pub fn observe(&self) -> observe::Config {
        observe::Config::new(&self.log, self.stderr_threshold, self.use_json_logs)
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self {
            network,
            node_url,
            mnemonic: _,
            maker_account_index,
            taker_account_index,
            relayer,
            maker_token,
            maker_amount,
            taker_amount,
            maker_token_decimals,
            order_validity,
            signing_scheme,
            confirmation_timeout,
            confirmation_poll_interval,
            orderbook_only,
            log,
            stderr_threshold,
            use_json_logs,
        } = self;

        writeln!(f, "network: {network}")?;
        writeln!(f, "node_url: {}", display_option(node_url.as_ref().map(|_| "SECRET")))?;
        writeln!(f, "mnemonic: SECRET")?;
        writeln!(f, "maker_account_index: {maker_account_index}")?;
        writeln!(f, "taker_account_index: {taker_account_index}")?;
        write!(f, "{relayer}")?;
        writeln!(f, "maker_token: {}", display_option(maker_token.as_ref()))?;
        writeln!(f, "maker_amount: {maker_amount}")?;
        writeln!(f, "taker_amount: {taker_amount}")?;
        writeln!(f, "maker_token_decimals: {maker_token_decimals}")?;
        writeln!(f, "order_validity: {order_validity:?}")?;
        writeln!(f, "signing_scheme: {signing_scheme:?}")?;
        writeln!(f, "confirmation_timeout: {confirmation_timeout:?}")?;
        writeln!(f, "confirmation_poll_interval: {confirmation_poll_interval:?}")?;
        writeln!(f, "orderbook_only: {orderbook_only}")?;
        writeln!(f, "log: {log}")?;
        writeln!(f, "stderr_threshold: {stderr_threshold:?}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")
    }
}

fn display_option(option: Option<impl Display>) -> String {
    option.map_or_else(|| "None".to_owned(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use {super::*, clap::Parser};

    #[test]
    fn defaults_target_local_development() {
        let args = Arguments::try_parse_from(["maker"]).unwrap();
        assert_eq!(args.network, Network::GANACHE);
        assert_eq!(args.node_url().as_str(), "http://127.0.0.1:8545/");
        assert_eq!(args.maker_token(), Network::GANACHE.addresses.zrx_token);
        assert_eq!(args.signing_scheme, EcdsaSigningScheme::EthSign);
        assert_eq!(args.order_validity, Duration::from_secs(600));
        assert_eq!(args.relayer.relayer_attempts, 3);
        assert_eq!(
            args.relayer.relayer_url.as_str(),
            "http://localhost:3300/v2/"
        );
    }

    #[test]
    fn parses_overrides() {
        let args = Arguments::try_parse_from([
            "maker",
            "--network",
            "42",
            "--signing-scheme",
            "eip712",
            "--order-validity",
            "1h",
            "--node-url",
            "https://node.example.com/key",
        ])
        .unwrap();
        assert_eq!(args.network, Network::KOVAN);
        assert_eq!(args.signing_scheme, EcdsaSigningScheme::Eip712);
        assert_eq!(args.order_validity, Duration::from_secs(3600));
        assert_eq!(args.node_url().as_str(), "https://node.example.com/key");
    }

    #[test]
    fn display_hides_secrets() {
        let args = Arguments::try_parse_from([
            "maker",
            "--node-url",
            "https://node.example.com/key",
        ])
        .unwrap();
        let display = args.to_string();
        assert!(display.contains("mnemonic: SECRET"), "{display}");
        assert!(!display.contains("concert"), "{display}");
        assert!(!display.contains("node.example.com"), "{display}");
        assert!(display.contains("relayer_url: http://localhost:3300/v2/"));
    }
}
