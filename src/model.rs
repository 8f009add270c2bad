use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Cipher string used when the operator does not supply one: every suite the
/// library knows, RSA-authenticated suites pushed to the end.
pub const DEFAULT_CIPHER_SPEC: &str = "ALL:COMPLEMENTOFALL:+aRSA";

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_BENCH_ITERATIONS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub host: String,
    pub port: u16,
}

impl TargetSpec {
    /// Server name to announce through SNI, if the host is a name at all.
    pub fn default_server_name(&self) -> Option<String> {
        if self.host.parse::<std::net::IpAddr>().is_ok() {
            None
        } else {
            Some(self.host.clone())
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub target: TargetSpec,
    pub server_name: Option<String>,
    pub trust_path: Option<PathBuf>,
    pub timeout: Duration,
    pub delay: Option<Duration>,
    pub cipher_spec: String,
    pub benchmark: Option<u32>,
    pub all_ciphers: bool,
    pub output: OutputConfig,
}

impl Config {
    pub fn new(target: TargetSpec) -> Self {
        Self {
            server_name: target.default_server_name(),
            target,
            trust_path: None,
            timeout: DEFAULT_TIMEOUT,
            delay: None,
            cipher_spec: DEFAULT_CIPHER_SPEC.to_string(),
            benchmark: None,
            all_ciphers: false,
            output: OutputConfig {
                format: OutputFormat::Table,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    Ssl2,
    Ssl3,
    Tls1,
    Tls11,
    Tls12,
}

impl ProtocolVersion {
    /// Fixed probing order, lowest version first.
    pub const SWEEP: [ProtocolVersion; 5] = [
        ProtocolVersion::Ssl2,
        ProtocolVersion::Ssl3,
        ProtocolVersion::Tls1,
        ProtocolVersion::Tls11,
        ProtocolVersion::Tls12,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProtocolVersion::Ssl2 => "SSLv2",
            ProtocolVersion::Ssl3 => "SSLv3",
            ProtocolVersion::Tls1 => "TLSv1",
            ProtocolVersion::Tls11 => "TLSv1.1",
            ProtocolVersion::Tls12 => "TLSv1.2",
        }
    }

    /// SSLv2 predates the server_name extension.
    pub fn supports_sni(&self) -> bool {
        !matches!(self, ProtocolVersion::Ssl2)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Session characteristics captured for one accepted cipher suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub cipher_name: String,
    /// Trailing run of sweep versions that negotiated `cipher_name`.
    pub protocols: Vec<ProtocolVersion>,
    pub public_key_bits: Option<u32>,
    pub signature_algorithm: Option<String>,
    pub trusted: bool,
    pub ticket_hint: Option<u64>,
    pub ocsp_stapled: bool,
    pub forward_secrecy: Option<String>,
}

impl SessionRecord {
    pub fn highest_protocol(&self) -> Option<ProtocolVersion> {
        self.protocols.iter().max().copied()
    }
}

/// Accepted suites in discovery order; index 0 is the server's first pick.
pub type PreferenceList = Vec<SessionRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingVerdict {
    ServerSide,
    ClientSide,
}

impl OrderingVerdict {
    pub fn is_server_side(&self) -> bool {
        matches!(self, OrderingVerdict::ServerSide)
    }
}

impl fmt::Display for OrderingVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingVerdict::ServerSide => write!(f, "Server side cipher ordering"),
            OrderingVerdict::ClientSide => write!(f, "Client side cipher ordering"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success(SessionRecord),
    /// The transport came up but no suite was agreed; the record is partial.
    CipherRejected(SessionRecord),
    ConnectionFailure,
}

#[derive(Debug, Clone)]
pub struct CipherEntry {
    pub record: SessionRecord,
    pub avg_handshake_micros: Option<u128>,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub target: TargetSpec,
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<CipherEntry>,
    pub verdict: OrderingVerdict,
}

impl ScanReport {
    pub fn benchmarked(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.avg_handshake_micros.is_some())
    }
}
