//! Dry-run binary for `engine_bridge`.
//!
//! Assembles a configuration from the command line against
//! [`DryRunEngine`] and prints the filter chain and collections in the order
//! the engine receives them.

mod cli;

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use engine_bridge::{
    EngineConfiguration,
    NamedFilter,
    NativeFilterEntry,
    TrustChainVerification,
    codec::{decode_mapping, decode_strings},
    engine::{DryRunEngine, Engine},
    init,
};
use tracing::error;

fn main() -> ExitCode {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "dry run failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: cli::Cli) -> Result<(), Box<dyn std::error::Error>> {
    init::initialize();

    let mut builder = EngineConfiguration::builder();
    if let Some(app_id) = cli.app_id {
        builder = builder.app_id(app_id);
    }
    if let Some(app_version) = cli.app_version {
        builder = builder.app_version(app_version);
    }
    if let Some(max) = cli.max_connections_per_host {
        builder = builder.max_connections_per_host(max);
    }
    if cli.accept_untrusted {
        builder = builder.trust_chain_verification(TrustChainVerification::AcceptUntrusted);
    }
    for (name, config) in cli.native_filters {
        builder = builder.add_native_filter(NativeFilterEntry::new(name, config));
    }
    for name in cli.platform_filters {
        builder = builder.add_platform_filter(Arc::new(NamedFilter::new(name)));
    }
    for sink in cli.stat_sinks {
        builder = builder.add_stat_sink(sink);
    }
    for host in cli.dns_preresolve {
        builder = builder.add_dns_preresolve_hostname(host);
    }
    for (host, port) in cli.quic_hints {
        builder = builder.add_quic_hint(host, port);
    }
    for (name, enabled) in cli.runtime_guards {
        builder = builder.set_runtime_guard(name, enabled);
    }
    let config = builder.build()?;

    let dry_run = Arc::new(DryRunEngine::new());
    let engine: Arc<dyn Engine> = dry_run.clone();
    config.register_platform_apis(&*engine)?;
    let bootstrap = config.assemble(&engine)?;
    let request = dry_run
        .last_request()
        .ok_or("dry-run engine recorded no request")?;

    println!("bootstrap {}", bootstrap.raw().get());
    println!(
        "enforce trust chain verification: {}",
        request.enforce_trust_chain_verification
    );
    println!("filter chain (engine order):");
    for (name, config) in decode_mapping(&request.filter_chain)? {
        println!("  {name} {config}");
    }
    print_list("stat sinks", &decode_strings(&request.stat_sinks)?);
    print_list(
        "dns preresolve hostnames",
        &decode_strings(&request.dns_preresolve_hostnames)?,
    );
    print_mapping("quic hints", &decode_mapping(&request.quic_hints)?);
    print_mapping("runtime guards", &decode_mapping(&request.runtime_guards)?);
    Ok(())
}

fn print_list(label: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    println!("{label}:");
    for value in values {
        println!("  {value}");
    }
}

fn print_mapping(label: &str, entries: &[(String, String)]) {
    if entries.is_empty() {
        return;
    }
    println!("{label}:");
    for (key, value) in entries {
        println!("  {key} = {value}");
    }
}
