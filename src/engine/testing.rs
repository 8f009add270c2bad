use crate::model::ProtocolVersion;
use crate::tls::{HandshakeEngine, HandshakeReport, HandshakeRequest};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) enum Selection {
    Server,
    Client,
    Fixed(String),
    /// Answers with this suite even when the offer excludes it.
    Stubborn(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub protocol: Option<ProtocolVersion>,
    pub cipher_spec: String,
    pub server_name: Option<String>,
}

/// Deterministic peer that understands just enough cipher-string syntax:
/// `!NAME` removes a suite, a known name offers it, `+...` is ignored and any
/// other keyword offers every remaining suite in ranking order.
pub(crate) struct RankedEngine {
    ranking: Vec<String>,
    selection: Selection,
    protocols: Vec<ProtocolVersion>,
    calls: Mutex<Vec<Call>>,
}

impl RankedEngine {
    pub fn new(ranking: &[&str], selection: Selection) -> Self {
        Self {
            ranking: ranking.iter().map(|name| name.to_string()).collect(),
            selection,
            protocols: vec![ProtocolVersion::Tls12],
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_protocols(mut self, protocols: &[ProtocolVersion]) -> Self {
        self.protocols = protocols.to_vec();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn offered(&self, spec: &str) -> Vec<String> {
        let mut excluded = HashSet::new();
        let mut offered: Vec<String> = Vec::new();
        for token in spec.split(':') {
            if let Some(name) = token.strip_prefix('!') {
                excluded.insert(name.to_string());
            } else if token.starts_with('+') || token.starts_with('@') || token.is_empty() {
                continue;
            } else if self.ranking.iter().any(|name| name == token) {
                if !offered.iter().any(|name| name == token) {
                    offered.push(token.to_string());
                }
            } else {
                for name in &self.ranking {
                    if !offered.contains(name) {
                        offered.push(name.clone());
                    }
                }
            }
        }
        offered.retain(|name| !excluded.contains(name));
        offered
    }
}

#[async_trait]
impl HandshakeEngine for RankedEngine {
    fn name(&self) -> &'static str {
        "ranked-stub"
    }

    async fn handshake(&self, request: &HandshakeRequest<'_>) -> anyhow::Result<HandshakeReport> {
        self.calls.lock().unwrap().push(Call {
            protocol: request.protocol,
            cipher_spec: request.cipher_spec.to_string(),
            server_name: request.server_name.map(str::to_string),
        });

        let protocol = request
            .protocol
            .unwrap_or(ProtocolVersion::Tls12);
        if !self.protocols.contains(&protocol) {
            anyhow::bail!("protocol {protocol} not enabled");
        }

        let offered = self.offered(request.cipher_spec);
        let chosen = match &self.selection {
            Selection::Server => self.ranking.iter().find(|name| offered.contains(name)).cloned(),
            Selection::Client => offered.first().cloned(),
            Selection::Fixed(name) => offered.iter().find(|offer| *offer == name).cloned(),
            Selection::Stubborn(name) => Some(name.clone()),
        };
        let Some(cipher) = chosen else {
            anyhow::bail!("no cipher match");
        };

        Ok(HandshakeReport {
            protocol: Some(protocol),
            cipher: Some(cipher),
            public_key_bits: Some(2048),
            signature_algorithm: Some("sha256WithRSAEncryption".into()),
            trusted: true,
            ticket_hint: Some(300),
            ocsp_stapled: false,
            forward_secrecy: Some("ECDH,P-256,256bits".into()),
        })
    }
}

/// Answers each protocol version with a canned report, or fails.
pub(crate) struct ScriptedEngine {
    replies: HashMap<ProtocolVersion, HandshakeReport>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(mut self, protocol: ProtocolVersion, report: HandshakeReport) -> Self {
        self.replies.insert(protocol, report);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HandshakeEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted-stub"
    }

    async fn handshake(&self, request: &HandshakeRequest<'_>) -> anyhow::Result<HandshakeReport> {
        self.calls.lock().unwrap().push(Call {
            protocol: request.protocol,
            cipher_spec: request.cipher_spec.to_string(),
            server_name: request.server_name.map(str::to_string),
        });
        request
            .protocol
            .and_then(|protocol| self.replies.get(&protocol).cloned())
            .ok_or_else(|| anyhow::anyhow!("connection refused"))
    }
}

pub(crate) fn report(protocol: ProtocolVersion, cipher: Option<&str>) -> HandshakeReport {
    HandshakeReport {
        protocol: Some(protocol),
        cipher: cipher.map(str::to_string),
        ..HandshakeReport::default()
    }
}
