use super::{flag, or_absent};
use crate::model::{ScanReport, SessionRecord};
use chrono::SecondsFormat;
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    target: String,
    utctimestamp: String,
    serverside: &'static str,
    ciphersuite: Vec<JsonCipher<'a>>,
}

#[derive(Serialize)]
struct JsonCipher<'a> {
    cipher: &'a str,
    protocols: Vec<&'static str>,
    pubkey: Vec<String>,
    sigalg: Vec<String>,
    trusted: &'static str,
    ticket_hint: String,
    ocsp_stapling: &'static str,
    pfs: String,
}

impl<'a> From<&'a SessionRecord> for JsonCipher<'a> {
    fn from(record: &'a SessionRecord) -> Self {
        JsonCipher {
            cipher: &record.cipher_name,
            protocols: record.protocols.iter().map(|p| p.label()).collect(),
            pubkey: vec![or_absent(record.public_key_bits)],
            sigalg: vec![or_absent(record.signature_algorithm.as_deref())],
            trusted: flag(record.trusted),
            ticket_hint: or_absent(record.ticket_hint),
            ocsp_stapling: flag(record.ocsp_stapled),
            pfs: or_absent(record.forward_secrecy.as_deref()),
        }
    }
}

pub fn render(report: &ScanReport) -> anyhow::Result<String> {
    let document = JsonReport {
        target: report.target.to_string(),
        utctimestamp: report.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        serverside: flag(report.verdict.is_server_side()),
        ciphersuite: report
            .entries
            .iter()
            .map(|entry| JsonCipher::from(&entry.record))
            .collect(),
    };
    Ok(serde_json::to_string(&document)?)
}
