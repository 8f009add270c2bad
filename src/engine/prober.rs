use crate::model::{ProbeOutcome, ProtocolVersion, SessionRecord, TargetSpec};
use crate::tls::{HandshakeEngine, HandshakeReport, HandshakeRequest};
use tracing::{debug, trace};

/// Cipher name carried by a partial record when no suite was agreed.
pub const NO_CIPHER: &str = "(NONE)";

#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    pub server_name: Option<String>,
}

/// Runs one cipher spec across the whole protocol sweep.
pub struct HandshakeProber<'a, E: ?Sized> {
    engine: &'a E,
    target: &'a TargetSpec,
    options: ProbeOptions,
}

impl<'a, E: HandshakeEngine + ?Sized> HandshakeProber<'a, E> {
    pub fn new(engine: &'a E, target: &'a TargetSpec, options: ProbeOptions) -> Self {
        Self {
            engine,
            target,
            options,
        }
    }

    pub async fn probe(&self, cipher_spec: &str) -> ProbeOutcome {
        let mut accepted: Option<SessionRecord> = None;
        let mut rejected: Option<SessionRecord> = None;
        // Whether the latest attempt that reached a protocol agreed no cipher.
        let mut last_rejected = false;

        for version in ProtocolVersion::SWEEP {
            let server_name = if version.supports_sni() {
                self.options.server_name.as_deref()
            } else {
                None
            };
            let request = HandshakeRequest {
                target: self.target,
                cipher_spec,
                protocol: Some(version),
                server_name,
            };

            let report = match self.engine.handshake(&request).await {
                Ok(report) => report,
                Err(err) => {
                    trace!(protocol = %version, error = %err, "no handshake");
                    continue;
                }
            };
            let Some(protocol) = report.protocol else {
                trace!(protocol = %version, "no protocol negotiated");
                continue;
            };

            match report
                .cipher
                .as_deref()
                .filter(|cipher| !cipher.is_empty() && *cipher != NO_CIPHER)
            {
                Some(cipher) => {
                    absorb(&mut accepted, cipher, protocol, &report);
                    rejected = None;
                    last_rejected = false;
                }
                None => {
                    absorb(&mut rejected, NO_CIPHER, protocol, &report);
                    last_rejected = true;
                }
            }
        }

        match (accepted, rejected) {
            (_, Some(partial)) if last_rejected => {
                debug!(spec = cipher_spec, "connected but no suite agreed");
                ProbeOutcome::CipherRejected(partial)
            }
            (Some(record), _) => {
                debug!(
                    spec = cipher_spec,
                    cipher = %record.cipher_name,
                    protocols = ?record.protocols,
                    "suite accepted"
                );
                ProbeOutcome::Success(record)
            }
            (None, _) => {
                debug!(spec = cipher_spec, "no protocol version connected");
                ProbeOutcome::ConnectionFailure
            }
        }
    }
}

/// Folds one successful attempt into the running record. The protocol list
/// restarts whenever the cipher changes; the scalars always follow the latest
/// attempt.
fn absorb(
    slot: &mut Option<SessionRecord>,
    cipher: &str,
    protocol: ProtocolVersion,
    report: &HandshakeReport,
) {
    let protocols = match slot.take() {
        Some(mut record) if record.cipher_name == cipher => {
            record.protocols.push(protocol);
            record.protocols
        }
        _ => vec![protocol],
    };

    *slot = Some(SessionRecord {
        cipher_name: cipher.to_string(),
        protocols,
        public_key_bits: report.public_key_bits,
        signature_algorithm: report.signature_algorithm.clone(),
        trusted: report.trusted,
        ticket_hint: report.ticket_hint,
        ocsp_stapled: report.ocsp_stapled,
        forward_secrecy: report.forward_secrecy.clone(),
    });
}
