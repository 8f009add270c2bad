pub mod backend;
pub mod ciphers;
pub mod trust;

use crate::model::{ProtocolVersion, TargetSpec};
use async_trait::async_trait;

pub use backend::OpensslEngine;
pub use trust::TrustAnchor;

/// One handshake attempt as handed to a [`HandshakeEngine`].
#[derive(Debug, Clone, Copy)]
pub struct HandshakeRequest<'a> {
    pub target: &'a TargetSpec,
    pub cipher_spec: &'a str,
    /// `None` lets the library negotiate anything it supports up to TLSv1.2.
    pub protocol: Option<ProtocolVersion>,
    pub server_name: Option<&'a str>,
}

/// Fields read back from a completed handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeReport {
    pub protocol: Option<ProtocolVersion>,
    /// `None` when the peer answered without agreeing on a suite.
    pub cipher: Option<String>,
    pub public_key_bits: Option<u32>,
    pub signature_algorithm: Option<String>,
    pub trusted: bool,
    pub ticket_hint: Option<u64>,
    pub ocsp_stapled: bool,
    pub forward_secrecy: Option<String>,
}

impl HandshakeReport {
    pub fn negotiated(&self) -> bool {
        self.protocol.is_some() && self.cipher.is_some()
    }
}

/// Performs a single, independent TLS handshake.
///
/// An `Err` means the attempt never reached a negotiated protocol: refused
/// connection, handshake alert, timeout, or a protocol the engine cannot
/// speak. Implementations must not reuse sessions between calls.
#[async_trait]
pub trait HandshakeEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handshake(&self, request: &HandshakeRequest<'_>) -> anyhow::Result<HandshakeReport>;
}


#[async_trait]
impl<E: HandshakeEngine + ?Sized> HandshakeEngine for &E {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn handshake(&self, request: &HandshakeRequest<'_>) -> anyhow::Result<HandshakeReport> {
        (**self).handshake(request).await
    }
}
