pub mod bench;
pub mod ordering;
pub mod prober;
pub mod rate;
pub mod walker;

#[cfg(test)]
pub(crate) mod testing;

use crate::model::{CipherEntry, Config, PreferenceList, ScanReport};
use crate::tls::ciphers::CATALOG;
use crate::tls::HandshakeEngine;
use bench::BenchmarkSampler;
use chrono::Utc;
use ordering::OrderingClassifier;
use prober::{HandshakeProber, ProbeOptions};
use rate::Throttle;
use tracing::{info, instrument};
use walker::PreferenceWalker;

/// One scan invocation: discovery, ordering, optional individual sweep and
/// optional benchmark, strictly one handshake at a time.
pub struct Scanner<E> {
    cfg: Config,
    engine: E,
}

impl<E: HandshakeEngine> Scanner<E> {
    pub fn new(cfg: Config, engine: E) -> Self {
        Self { cfg, engine }
    }

    #[instrument(skip(self), fields(target = %self.cfg.target, engine = self.engine.name()))]
    pub async fn run(&self) -> ScanReport {
        let options = ProbeOptions {
            server_name: self.cfg.server_name.clone(),
        };
        let prober = HandshakeProber::new(&self.engine, &self.cfg.target, options);
        let walker = PreferenceWalker::new(&prober, Throttle::new(self.cfg.delay));

        let mut ciphers = walker.discover(&self.cfg.cipher_spec).await;
        let verdict = OrderingClassifier::new(&prober).classify(&ciphers).await;
        info!(
            suites = ciphers.len(),
            server_side = verdict.is_server_side(),
            "preference discovery complete"
        );

        if self.cfg.all_ciphers {
            let before = ciphers.len();
            walker.sweep_individually(CATALOG, &mut ciphers).await;
            info!(
                added = ciphers.len() - before,
                "individual cipher sweep complete"
            );
        }

        let entries = self.benchmark(ciphers).await;

        ScanReport {
            target: self.cfg.target.clone(),
            timestamp: Utc::now(),
            entries,
            verdict,
        }
    }

    async fn benchmark(&self, ciphers: PreferenceList) -> Vec<CipherEntry> {
        let Some(iterations) = self.cfg.benchmark else {
            return ciphers
                .into_iter()
                .map(|record| CipherEntry {
                    record,
                    avg_handshake_micros: None,
                })
                .collect();
        };

        let sampler = BenchmarkSampler::new(
            &self.engine,
            &self.cfg.target,
            self.cfg.server_name.as_deref(),
            iterations,
        );
        let mut entries = Vec::with_capacity(ciphers.len());
        for record in ciphers {
            let mean = sampler
                .measure(&record.cipher_name, record.highest_protocol())
                .await;
            info!(cipher = %record.cipher_name, mean_micros = %mean, "benchmarked suite");
            entries.push(CipherEntry {
                record,
                avg_handshake_micros: Some(mean),
            });
        }
        entries
    }
}
