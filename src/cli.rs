use crate::input::parse_target;
use crate::model::{
    Config, OutputConfig, OutputFormat, DEFAULT_BENCH_ITERATIONS, DEFAULT_CIPHER_SPEC,
};
use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Discover the cipher suites a TLS server accepts, in its order of preference",
    long_about = None
)]
pub struct Cli {
    /// Log every probe
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Log handshake-level detail
    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Shorthand for --output json
    #[arg(short = 'j', long = "json", action = ArgAction::SetTrue)]
    pub json: bool,

    /// Output format
    #[arg(long = "output", default_value_t = Format::Table)]
    pub output: Format,

    /// Measure mean handshake latency for every accepted suite
    #[arg(short = 'b', long = "benchmark", action = ArgAction::SetTrue)]
    pub benchmark: bool,

    /// Handshakes per suite in benchmark mode
    #[arg(long = "bench-iterations", default_value_t = DEFAULT_BENCH_ITERATIONS)]
    pub bench_iterations: u32,

    /// Also try every known suite individually once discovery is done
    #[arg(short = 'a', long = "allciphers", action = ArgAction::SetTrue)]
    pub all_ciphers: bool,

    /// CA bundle file or hashed CA directory used to verify certificates
    #[arg(long = "capath", value_name = "PATH")]
    pub capath: Option<PathBuf>,

    /// Seconds to wait after every probe
    #[arg(long = "delay", value_name = "SECS")]
    pub delay: Option<f64>,

    /// Handshake timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Cipher string discovery starts from
    #[arg(long = "ciphers", value_name = "SPEC", default_value = DEFAULT_CIPHER_SPEC)]
    pub ciphers: String,

    /// Engine options (-servername NAME, -noservername) followed by host[:port]
    #[arg(
        value_name = "ARGS",
        required = true,
        num_args = 1..,
        allow_hyphen_values = true,
        trailing_var_arg = true
    )]
    pub args: Vec<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Table => write!(f, "table"),
            Format::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ServerName {
    FromHost,
    Explicit(String),
    Disabled,
}

impl Cli {
    /// Filter directive used when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }

    pub fn into_config(self) -> anyhow::Result<Config> {
        let Some((target, engine_args)) = self.args.split_last() else {
            anyhow::bail!("a target host[:port] is required");
        };
        let target =
            parse_target(target).with_context(|| format!("invalid target {target:?}"))?;

        if self.bench_iterations == 0 {
            anyhow::bail!("bench-iterations must be greater than zero");
        }

        if self.timeout_secs == 0 {
            anyhow::bail!("timeout must be greater than zero");
        }

        let delay = self
            .delay
            .map(Duration::try_from_secs_f64)
            .transpose()
            .context("delay must be a non-negative number of seconds")?;

        let server_name = match parse_engine_args(engine_args)? {
            ServerName::FromHost => target.default_server_name(),
            ServerName::Explicit(name) => Some(name),
            ServerName::Disabled => None,
        };

        Ok(Config {
            target,
            server_name,
            trust_path: self.capath,
            timeout: Duration::from_secs(self.timeout_secs),
            delay,
            cipher_spec: self.ciphers,
            benchmark: self.benchmark.then_some(self.bench_iterations),
            all_ciphers: self.all_ciphers,
            output: OutputConfig {
                format: if self.json {
                    OutputFormat::Json
                } else {
                    match self.output {
                        Format::Table => OutputFormat::Table,
                        Format::Json => OutputFormat::Json,
                    }
                },
            },
        })
    }
}

fn parse_engine_args(args: &[String]) -> anyhow::Result<ServerName> {
    let mut server_name = ServerName::FromHost;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-servername" => {
                let name = iter.next().context("-servername requires a value")?;
                server_name = ServerName::Explicit(name.clone());
            }
            "-noservername" => server_name = ServerName::Disabled,
            other => anyhow::bail!("unsupported engine argument {other}"),
        }
    }
    Ok(server_name)
}
