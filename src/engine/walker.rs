use super::prober::HandshakeProber;
use super::rate::Throttle;
use crate::model::{PreferenceList, ProbeOutcome};
use crate::tls::ciphers::exclusion_spec;
use crate::tls::HandshakeEngine;
use tracing::{debug, info, warn};

/// Recovers the peer's preference order by excluding each accepted suite and
/// asking again until nothing is left.
pub struct PreferenceWalker<'a, E: ?Sized> {
    prober: &'a HandshakeProber<'a, E>,
    throttle: Throttle,
}

impl<'a, E: HandshakeEngine + ?Sized> PreferenceWalker<'a, E> {
    pub fn new(prober: &'a HandshakeProber<'a, E>, throttle: Throttle) -> Self {
        Self { prober, throttle }
    }

    pub async fn discover(&self, initial_spec: &str) -> PreferenceList {
        let mut found = PreferenceList::new();
        let mut excluded: Vec<String> = Vec::new();

        loop {
            let spec = exclusion_spec(&excluded, initial_spec);
            let outcome = self.prober.probe(&spec).await;
            self.throttle.pause().await;

            let record = match outcome {
                ProbeOutcome::Success(record) => record,
                ProbeOutcome::CipherRejected(_) | ProbeOutcome::ConnectionFailure => break,
            };
            if excluded.contains(&record.cipher_name) {
                warn!(
                    cipher = %record.cipher_name,
                    "peer negotiated an excluded suite; stopping discovery"
                );
                break;
            }

            info!(
                rank = found.len(),
                cipher = %record.cipher_name,
                "discovered suite"
            );
            excluded.push(record.cipher_name.clone());
            found.push(record);
        }

        debug!(count = found.len(), "preference discovery finished");
        found
    }

    /// Tries each named suite on its own and appends the accepted ones that
    /// discovery did not already find.
    pub async fn sweep_individually(&self, catalog: &[&str], found: &mut PreferenceList) {
        for &cipher in catalog {
            if found.iter().any(|record| record.cipher_name == cipher) {
                continue;
            }

            let outcome = self.prober.probe(cipher).await;
            self.throttle.pause().await;

            if let ProbeOutcome::Success(record) = outcome {
                if found
                    .iter()
                    .any(|known| known.cipher_name == record.cipher_name)
                {
                    continue;
                }
                info!(cipher = %record.cipher_name, "suite accepted individually");
                found.push(record);
            }
        }
    }
}
