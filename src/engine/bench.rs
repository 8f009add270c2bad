use crate::model::{ProtocolVersion, TargetSpec};
use crate::tls::{HandshakeEngine, HandshakeRequest};
use tokio::time::Instant;
use tracing::debug;

/// Times repeated handshakes for a single suite.
pub struct BenchmarkSampler<'a, E: ?Sized> {
    engine: &'a E,
    target: &'a TargetSpec,
    server_name: Option<&'a str>,
    iterations: u32,
}

impl<'a, E: HandshakeEngine + ?Sized> BenchmarkSampler<'a, E> {
    pub fn new(
        engine: &'a E,
        target: &'a TargetSpec,
        server_name: Option<&'a str>,
        iterations: u32,
    ) -> Self {
        Self {
            engine,
            target,
            server_name,
            iterations,
        }
    }

    /// Mean microseconds per handshake. The loop stops at the first failure,
    /// but the divisor stays the configured iteration count.
    pub async fn measure(&self, cipher_name: &str, protocol: Option<ProtocolVersion>) -> u128 {
        if self.iterations == 0 {
            return 0;
        }

        let request = HandshakeRequest {
            target: self.target,
            cipher_spec: cipher_name,
            protocol,
            server_name: self.server_name,
        };

        let start = Instant::now();
        let mut completed = 0u32;
        while completed < self.iterations {
            let negotiated = match self.engine.handshake(&request).await {
                Ok(report) => report.negotiated(),
                Err(err) => {
                    debug!(cipher = cipher_name, error = %err, "benchmark handshake failed");
                    false
                }
            };
            if !negotiated {
                break;
            }
            completed += 1;
        }
        let elapsed = start.elapsed();

        let mean = elapsed.as_nanos() / 1000 / u128::from(self.iterations);
        debug!(
            cipher = cipher_name,
            completed,
            iterations = self.iterations,
            mean_micros = %mean,
            "benchmark finished"
        );
        mean
    }
}
