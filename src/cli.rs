//! Command line interface for the `engine-bridge` binary.
//!
//! The binary assembles a configuration against a dry-run engine and prints
//! what the engine would receive. It is a diagnostic for filter ordering and
//! template validation.

use clap::Parser;

/// Command line arguments for the `engine-bridge` binary.
#[derive(Debug, Parser)]
#[command(
    name = "engine-bridge",
    version,
    about = "Dry-run an engine configuration and print the bootstrap it produces"
)]
pub struct Cli {
    /// Native filter as NAME=CONFIG. Repeat to build the chain in order.
    #[arg(long = "native-filter", value_name = "NAME=CONFIG", value_parser = parse_pair)]
    pub native_filters: Vec<(String, String)>,

    /// Platform filter name. Repeat in registration order.
    #[arg(long = "platform-filter", value_name = "NAME")]
    pub platform_filters: Vec<String>,

    /// Stat sink configuration.
    #[arg(long = "stat-sink", value_name = "SINK")]
    pub stat_sinks: Vec<String>,

    /// Hostname to resolve at startup.
    #[arg(long = "dns-preresolve", value_name = "HOST")]
    pub dns_preresolve: Vec<String>,

    /// Host known to speak HTTP/3, as HOST:PORT.
    #[arg(long = "quic-hint", value_name = "HOST:PORT", value_parser = parse_quic_hint)]
    pub quic_hints: Vec<(String, u16)>,

    /// Runtime guard as NAME=true|false.
    #[arg(long = "runtime-guard", value_name = "NAME=BOOL", value_parser = parse_guard)]
    pub runtime_guards: Vec<(String, bool)>,

    /// Application identifier reported to the engine.
    #[arg(long)]
    pub app_id: Option<String>,

    /// Application version reported to the engine.
    #[arg(long)]
    pub app_version: Option<String>,

    /// Maximum connections per upstream host.
    #[arg(long, value_name = "N")]
    pub max_connections_per_host: Option<u32>,

    /// Skip TLS trust-chain verification.
    #[arg(long)]
    pub accept_untrusted: bool,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))
}

fn parse_quic_hint(raw: &str) -> Result<(String, u16), String> {
    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected HOST:PORT, got `{raw}`"))?;
    let port = port
        .parse()
        .map_err(|err| format!("invalid port in `{raw}`: {err}"))?;
    Ok((host.to_owned(), port))
}

fn parse_guard(raw: &str) -> Result<(String, bool), String> {
    let (name, value) = parse_pair(raw)?;
    let enabled = value
        .parse()
        .map_err(|_| format!("expected true or false, got `{value}`"))?;
    Ok((name, enabled))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn parses_repeated_filters_in_order() {
        let cli = Cli::parse_from([
            "engine-bridge",
            "--native-filter",
            "A=cfg-a",
            "--native-filter",
            "B=cfg=b",
            "--platform-filter",
            "F1",
        ]);
        assert_eq!(
            cli.native_filters,
            [
                ("A".to_owned(), "cfg-a".to_owned()),
                ("B".to_owned(), "cfg=b".to_owned())
            ]
        );
        assert_eq!(cli.platform_filters, ["F1"]);
    }

    #[test]
    fn parses_quic_hints_and_guards() {
        let cli = Cli::parse_from([
            "engine-bridge",
            "--quic-hint",
            "example.com:443",
            "--runtime-guard",
            "test_feature=false",
            "--accept-untrusted",
        ]);
        assert_eq!(cli.quic_hints, [("example.com".to_owned(), 443)]);
        assert_eq!(cli.runtime_guards, [("test_feature".to_owned(), false)]);
        assert!(cli.accept_untrusted);
    }

    #[test]
    fn rejects_malformed_quic_hint() {
        assert!(Cli::try_parse_from(["engine-bridge", "--quic-hint", "example.com"]).is_err());
    }
}
