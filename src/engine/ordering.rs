use super::prober::HandshakeProber;
use crate::model::{OrderingVerdict, ProbeOutcome, SessionRecord};
use crate::tls::ciphers::ordered_offer;
use crate::tls::HandshakeEngine;
use tracing::debug;

/// How many of the top-ranked suites are re-offered in reverse.
const REORDER_DEPTH: usize = 3;

pub struct OrderingClassifier<'a, E: ?Sized> {
    prober: &'a HandshakeProber<'a, E>,
}

impl<'a, E: HandshakeEngine + ?Sized> OrderingClassifier<'a, E> {
    pub fn new(prober: &'a HandshakeProber<'a, E>) -> Self {
        Self { prober }
    }

    /// Offers the best suites in reverse discovery order. A peer that takes
    /// the first offered suite follows the client's ordering.
    pub async fn classify(&self, list: &[SessionRecord]) -> OrderingVerdict {
        if list.len() < 2 {
            return OrderingVerdict::ServerSide;
        }

        let mut offer: Vec<&str> = list
            .iter()
            .take(REORDER_DEPTH)
            .map(|record| record.cipher_name.as_str())
            .collect();
        offer.reverse();
        let spec = ordered_offer(&offer);

        match self.prober.probe(&spec).await {
            ProbeOutcome::Success(record) if record.cipher_name == offer[0] => {
                debug!(offer = %spec, cipher = %record.cipher_name, "peer took first offered suite");
                OrderingVerdict::ClientSide
            }
            ProbeOutcome::Success(record) => {
                debug!(offer = %spec, cipher = %record.cipher_name, "peer kept its own order");
                OrderingVerdict::ServerSide
            }
            ProbeOutcome::CipherRejected(_) | ProbeOutcome::ConnectionFailure => {
                debug!(offer = %spec, "ordering probe failed; assuming server side");
                OrderingVerdict::ServerSide
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::prober::ProbeOptions;
    use crate::engine::testing::{RankedEngine, Selection};
    use crate::model::{ProtocolVersion, TargetSpec};

    fn target() -> TargetSpec {
        TargetSpec {
            host: "example.net".into(),
            port: 443,
        }
    }

    fn record(name: &str) -> SessionRecord {
        SessionRecord {
            cipher_name: name.into(),
            protocols: vec![ProtocolVersion::Tls12],
            public_key_bits: Some(2048),
            signature_algorithm: None,
            trusted: false,
            ticket_hint: None,
            ocsp_stapled: false,
            forward_secrecy: None,
        }
    }

    #[tokio::test]
    async fn short_lists_are_server_side_without_probing() {
        let engine = RankedEngine::new(&["A"], Selection::Client);
        let target = target();
        let prober = HandshakeProber::new(&engine, &target, ProbeOptions::default());
        let classifier = OrderingClassifier::new(&prober);

        assert_eq!(classifier.classify(&[]).await, OrderingVerdict::ServerSide);
        assert_eq!(
            classifier.classify(&[record("A")]).await,
            OrderingVerdict::ServerSide
        );
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn two_entries_are_swapped() {
        let engine = RankedEngine::new(&["A", "B"], Selection::Client);
        let target = target();
        let prober = HandshakeProber::new(&engine, &target, ProbeOptions::default());
        let classifier = OrderingClassifier::new(&prober);

        let verdict = classifier.classify(&[record("A"), record("B")]).await;
        assert_eq!(verdict, OrderingVerdict::ClientSide);
        assert_eq!(engine.calls()[0].cipher_spec, "B:A");
    }

    #[tokio::test]
    async fn top_three_are_reversed() {
        let engine = RankedEngine::new(&["A", "B", "C", "D"], Selection::Server);
        let target = target();
        let prober = HandshakeProber::new(&engine, &target, ProbeOptions::default());
        let classifier = OrderingClassifier::new(&prober);

        let list = [record("A"), record("B"), record("C"), record("D")];
        let verdict = classifier.classify(&list).await;
        assert_eq!(verdict, OrderingVerdict::ServerSide);
        assert_eq!(engine.calls()[0].cipher_spec, "C:B:A");
    }

    #[tokio::test]
    async fn client_first_selection_is_client_side() {
        let engine = RankedEngine::new(&["A", "B", "C"], Selection::Client);
        let target = target();
        let prober = HandshakeProber::new(&engine, &target, ProbeOptions::default());
        let classifier = OrderingClassifier::new(&prober);

        let list = [record("A"), record("B"), record("C")];
        assert_eq!(
            classifier.classify(&list).await,
            OrderingVerdict::ClientSide
        );
    }

    #[tokio::test]
    async fn fixed_selection_is_server_side() {
        let engine = RankedEngine::new(&["A", "B", "C"], Selection::Fixed("B".into()));
        let target = target();
        let prober = HandshakeProber::new(&engine, &target, ProbeOptions::default());
        let classifier = OrderingClassifier::new(&prober);

        let list = [record("A"), record("B"), record("C")];
        assert_eq!(
            classifier.classify(&list).await,
            OrderingVerdict::ServerSide
        );
    }

    #[tokio::test]
    async fn failed_probe_defaults_to_server_side() {
        let engine = RankedEngine::new(&["A", "B"], Selection::Client).with_protocols(&[]);
        let target = target();
        let prober = HandshakeProber::new(&engine, &target, ProbeOptions::default());
        let classifier = OrderingClassifier::new(&prober);

        let list = vec![record("A"), record("B")];
        assert_eq!(
            classifier.classify(&list).await,
            OrderingVerdict::ServerSide
        );
        assert_eq!(list.len(), 2);
    }
}
