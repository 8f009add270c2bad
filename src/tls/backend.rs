use super::{HandshakeEngine, HandshakeReport, HandshakeRequest, TrustAnchor};
use crate::model::ProtocolVersion;
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use foreign_types::ForeignTypeRef;
use openssl::nid::Nid;
use openssl::pkey::{HasPublic, Id, PKeyRef};
use openssl::ssl::{
    Ssl, SslContext, SslContextBuilder, SslMethod, SslOptions, SslRef, SslSessionCacheMode,
    SslVerifyMode, SslVersion, StatusType,
};
use openssl::x509::X509VerifyResult;
use std::os::raw::{c_int, c_ulong};
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_openssl::SslStream;
use tracing::trace;

extern "C" {
    fn SSL_SESSION_has_ticket(session: *const openssl_sys::SSL_SESSION) -> c_int;
    fn SSL_SESSION_get_ticket_lifetime_hint(session: *const openssl_sys::SSL_SESSION) -> c_ulong;
}

/// Handshake engine backed by the system OpenSSL through `tokio-openssl`.
///
/// The context, and with it the trust store, is built once. Every attempt
/// gets its own `Ssl`, so nothing is resumed between probes.
pub struct OpensslEngine {
    context: SslContext,
    timeout: Duration,
}

impl OpensslEngine {
    /// Fails when the context cannot be built at all, which makes every
    /// later probe meaningless.
    pub fn new(trust: TrustAnchor, timeout: Duration) -> anyhow::Result<Self> {
        let context = client_context(&trust).context("TLS handshake engine unavailable")?;
        Ok(Self { context, timeout })
    }

    fn session(&self, request: &HandshakeRequest<'_>) -> anyhow::Result<Ssl> {
        let mut ssl = Ssl::new(&self.context).context("failed to create TLS session")?;
        ssl.set_cipher_list(&format!("{}:@SECLEVEL=0", request.cipher_spec))
            .with_context(|| format!("no cipher suite matches {}", request.cipher_spec))?;

        let (min, max) = match request.protocol {
            Some(version) => {
                let pinned = ssl_version(version)?;
                (Some(pinned), Some(pinned))
            }
            None => (None, Some(SslVersion::TLS1_2)),
        };
        ssl.set_min_proto_version(min)
            .context("failed to set minimum protocol version")?;
        ssl.set_max_proto_version(max)
            .context("failed to set maximum protocol version")?;

        ssl.set_status_type(StatusType::OCSP)
            .context("failed to request OCSP stapling")?;
        if let Some(name) = request.server_name {
            ssl.set_hostname(name)
                .with_context(|| format!("invalid server name {name}"))?;
        }
        Ok(ssl)
    }
}

fn client_context(trust: &TrustAnchor) -> anyhow::Result<SslContext> {
    let mut builder =
        SslContextBuilder::new(SslMethod::tls_client()).context("failed to create TLS context")?;
    // The chain is verified after the handshake so untrusted peers still
    // report their session details.
    builder.set_verify(SslVerifyMode::NONE);
    builder.clear_options(SslOptions::NO_SSLV3);
    builder.set_session_cache_mode(SslSessionCacheMode::OFF);

    match trust {
        TrustAnchor::Bundle(path) => builder
            .set_ca_file(path)
            .with_context(|| format!("failed to load CA bundle {}", path.display()))?,
        TrustAnchor::Directory(path) => builder
            .load_verify_locations(None, Some(path.as_path()))
            .with_context(|| format!("failed to load CA directory {}", path.display()))?,
        TrustAnchor::None => builder
            .set_default_verify_paths()
            .context("failed to load default trust anchors")?,
    }

    Ok(builder.build())
}

#[async_trait]
impl HandshakeEngine for OpensslEngine {
    fn name(&self) -> &'static str {
        "openssl"
    }

    async fn handshake(&self, request: &HandshakeRequest<'_>) -> anyhow::Result<HandshakeReport> {
        let ssl = self.session(request)?;
        let target = request.target;

        let attempt = async {
            let stream = TcpStream::connect((target.host.as_str(), target.port))
                .await
                .with_context(|| format!("cannot connect to {target}"))?;
            let mut tls_stream =
                SslStream::new(ssl, stream).context("failed to initialize TLS stream")?;
            Pin::new(&mut tls_stream)
                .connect()
                .await
                .with_context(|| format!("TLS handshake failed for {target}"))?;
            Ok::<_, anyhow::Error>(read_report(tls_stream.ssl()))
        };

        let report = tokio::time::timeout(self.timeout, attempt)
            .await
            .map_err(|_| anyhow!("handshake with {target} timed out after {:?}", self.timeout))??;
        trace!(
            cipher = ?report.cipher,
            protocol = ?report.protocol,
            "handshake completed"
        );
        Ok(report)
    }
}

fn ssl_version(version: ProtocolVersion) -> anyhow::Result<SslVersion> {
    Ok(match version {
        ProtocolVersion::Ssl2 => bail!("SSLv2 is not supported by the linked TLS library"),
        ProtocolVersion::Ssl3 => SslVersion::SSL3,
        ProtocolVersion::Tls1 => SslVersion::TLS1,
        ProtocolVersion::Tls11 => SslVersion::TLS1_1,
        ProtocolVersion::Tls12 => SslVersion::TLS1_2,
    })
}

fn protocol_version(version: SslVersion) -> Option<ProtocolVersion> {
    if version == SslVersion::SSL3 {
        Some(ProtocolVersion::Ssl3)
    } else if version == SslVersion::TLS1 {
        Some(ProtocolVersion::Tls1)
    } else if version == SslVersion::TLS1_1 {
        Some(ProtocolVersion::Tls11)
    } else if version == SslVersion::TLS1_2 {
        Some(ProtocolVersion::Tls12)
    } else {
        None
    }
}

fn read_report(ssl: &SslRef) -> HandshakeReport {
    let peer = ssl.peer_certificate();
    HandshakeReport {
        protocol: ssl.version2().and_then(protocol_version),
        cipher: ssl.current_cipher().map(|cipher| cipher.name().to_string()),
        public_key_bits: peer
            .as_ref()
            .and_then(|cert| cert.public_key().ok())
            .map(|key| key.bits()),
        signature_algorithm: peer
            .as_ref()
            .map(|cert| cert.signature_algorithm().object().to_string()),
        trusted: peer.is_some() && ssl.verify_result() == X509VerifyResult::OK,
        ticket_hint: ticket_hint(ssl),
        ocsp_stapled: ssl.ocsp_status().is_some(),
        forward_secrecy: ssl
            .peer_tmp_key()
            .ok()
            .and_then(|key| describe_ephemeral(&*key)),
    }
}

fn ticket_hint(ssl: &SslRef) -> Option<u64> {
    let session = ssl.session()?;
    // SAFETY: the session belongs to `ssl` and stays alive for both calls.
    unsafe {
        let ptr = session.as_ptr();
        if SSL_SESSION_has_ticket(ptr) == 0 {
            return None;
        }
        Some(u64::from(SSL_SESSION_get_ticket_lifetime_hint(ptr)))
    }
}

fn describe_ephemeral<T: HasPublic>(key: &PKeyRef<T>) -> Option<String> {
    let id = key.id();
    if id == Id::EC {
        let curve = key.ec_key().ok()?.group().curve_name()?;
        Some(format!("ECDH,{},{}bits", curve_label(curve), key.bits()))
    } else if id == Id::X25519 {
        Some(format!("ECDH,X25519,{}bits", key.bits()))
    } else if id == Id::X448 {
        Some(format!("ECDH,X448,{}bits", key.bits()))
    } else if id == Id::DH {
        Some(format!("DH,{}bits", key.bits()))
    } else {
        None
    }
}

fn curve_label(curve: Nid) -> &'static str {
    if curve == Nid::X9_62_PRIME256V1 {
        "P-256"
    } else if curve == Nid::SECP384R1 {
        "P-384"
    } else if curve == Nid::SECP521R1 {
        "P-521"
    } else if curve == Nid::SECP224R1 {
        "P-224"
    } else {
        curve.short_name().unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TargetSpec;
    use openssl::ec::{EcGroup, EcKey};
    use openssl::pkey::PKey;

    #[test]
    fn describes_nist_curves() {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();
        assert_eq!(
            describe_ephemeral(&*key).as_deref(),
            Some("ECDH,P-256,256bits")
        );
    }

    #[test]
    fn maps_protocol_versions() {
        assert!(ssl_version(ProtocolVersion::Ssl2).is_err());
        for version in ProtocolVersion::SWEEP.into_iter().skip(1) {
            let mapped = ssl_version(version).unwrap();
            assert_eq!(protocol_version(mapped), Some(version));
        }
    }

    #[test]
    fn rejects_unmatched_cipher_spec() {
        let engine = OpensslEngine::new(TrustAnchor::None, Duration::from_secs(1)).unwrap();
        let target = TargetSpec {
            host: "127.0.0.1".into(),
            port: 443,
        };
        let request = |cipher_spec| HandshakeRequest {
            target: &target,
            cipher_spec,
            protocol: Some(ProtocolVersion::Tls12),
            server_name: Some("localhost"),
        };

        assert!(engine.session(&request("NOT-A-REAL-SUITE")).is_err());
        assert!(engine.session(&request("AES128-SHA")).is_ok());
    }

    #[test]
    fn sessions_share_one_context() {
        let engine = OpensslEngine::new(TrustAnchor::None, Duration::from_secs(1)).unwrap();
        let target = TargetSpec {
            host: "127.0.0.1".into(),
            port: 443,
        };
        let request = HandshakeRequest {
            target: &target,
            cipher_spec: "ALL",
            protocol: None,
            server_name: None,
        };

        let first = engine.session(&request).unwrap();
        let second = engine.session(&request).unwrap();
        assert_eq!(
            first.ssl_context().as_ptr(),
            second.ssl_context().as_ptr()
        );
        assert!(first.session().is_none());
    }
}
