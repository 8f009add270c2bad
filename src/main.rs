use cipher_scan::cli::Cli;
use cipher_scan::engine::Scanner;
use cipher_scan::output::OutputSink;
use cipher_scan::tls::{OpensslEngine, TrustAnchor};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cfg = cli.into_config()?;

    let trust = match &cfg.trust_path {
        Some(path) => TrustAnchor::from_path(path)?,
        None => TrustAnchor::discover(),
    };
    debug!(%trust, "trust anchors selected");

    let engine = OpensslEngine::new(trust, cfg.timeout)?;
    let mut sink = OutputSink::stdout(cfg.output.clone());
    let report = Scanner::new(cfg, engine).run().await;
    sink.write_report(&report)?;

    Ok(())
}
