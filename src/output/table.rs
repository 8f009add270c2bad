use super::{flag, or_absent, ABSENT};
use crate::model::{CipherEntry, ScanReport, SessionRecord};
use std::fmt::Write;

const GAP: usize = 1;

pub fn render(report: &ScanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Target: {}\n", report.target);

    if report.entries.is_empty() {
        let _ = writeln!(out, "no cipher suite accepted by {}", report.target);
        return out;
    }

    let benchmarked = report.benchmarked();
    let condensed = shares_certificate(&report.entries);

    let mut headers = vec!["prio", "ciphersuite", "protocols"];
    if !condensed {
        headers.extend([
            "pubkey_size",
            "signature_algoritm",
            "trusted",
            "ticket_hint",
            "ocsp_staple",
        ]);
    }
    headers.push("pfs_keysize");
    if benchmarked {
        headers.push("avg_handshake_microsec");
    }

    let rows: Vec<Vec<String>> = report
        .entries
        .iter()
        .enumerate()
        .map(|(rank, entry)| row(rank, entry, condensed, benchmarked))
        .collect();

    write_grid(&mut out, &headers, &rows);

    if condensed {
        let first = &report.entries[0].record;
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Certificate: {}, {} bit, {} signature",
            if first.trusted { "trusted" } else { "untrusted" },
            or_absent(first.public_key_bits),
            or_absent(first.signature_algorithm.as_deref()),
        );
        let _ = writeln!(
            out,
            "TLS ticket lifetime hint: {}",
            or_absent(first.ticket_hint)
        );
        let _ = writeln!(
            out,
            "OCSP stapling: {}",
            if first.ocsp_stapled {
                "supported"
            } else {
                "not supported"
            }
        );
    }

    let _ = writeln!(out, "{}", report.verdict);
    out
}

/// True when every entry carries the same certificate-level details.
fn shares_certificate(entries: &[CipherEntry]) -> bool {
    let key = |record: &SessionRecord| {
        (
            record.public_key_bits,
            record.signature_algorithm.clone(),
            record.trusted,
            record.ticket_hint,
            record.ocsp_stapled,
        )
    };
    let first = key(&entries[0].record);
    entries.iter().all(|entry| key(&entry.record) == first)
}

fn row(rank: usize, entry: &CipherEntry, condensed: bool, benchmarked: bool) -> Vec<String> {
    let record = &entry.record;
    let protocols = record
        .protocols
        .iter()
        .map(|p| p.label())
        .collect::<Vec<_>>()
        .join(",");

    let mut cells = vec![
        (rank + 1).to_string(),
        record.cipher_name.clone(),
        if protocols.is_empty() {
            ABSENT.to_string()
        } else {
            protocols
        },
    ];
    if !condensed {
        cells.extend([
            or_absent(record.public_key_bits),
            or_absent(record.signature_algorithm.as_deref()),
            flag(record.trusted).to_string(),
            or_absent(record.ticket_hint),
            flag(record.ocsp_stapled).to_string(),
        ]);
    }
    cells.push(or_absent(record.forward_secrecy.as_deref()));
    if benchmarked {
        cells.push(or_absent(entry.avg_handshake_micros));
    }
    cells
}

fn write_grid(out: &mut String, headers: &[&str], rows: &[Vec<String>]) {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .map(|row| row[col].len())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    for cells in std::iter::once(&header_cells).chain(rows.iter()) {
        let mut line = String::new();
        for (cell, width) in cells.iter().zip(&widths) {
            let _ = write!(line, "{cell:<width$}", width = width + GAP);
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }
}
