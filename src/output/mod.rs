mod json;
mod table;

use crate::model::{OutputConfig, OutputFormat, ScanReport};
use std::fmt::Display;
use std::io::{BufWriter, Stdout, Write};

/// Literal used wherever a value is absent.
pub const ABSENT: &str = "None";

pub struct OutputSink<W: Write> {
    cfg: OutputConfig,
    writer: BufWriter<W>,
}

impl OutputSink<Stdout> {
    pub fn stdout(cfg: OutputConfig) -> Self {
        Self::new(cfg, std::io::stdout())
    }
}

impl<W: Write> OutputSink<W> {
    pub fn new(cfg: OutputConfig, writer: W) -> Self {
        Self {
            cfg,
            writer: BufWriter::new(writer),
        }
    }

    pub fn write_report(&mut self, report: &ScanReport) -> anyhow::Result<()> {
        match self.cfg.format {
            OutputFormat::Json => {
                let line = json::render(report)?;
                writeln!(self.writer, "{line}")?;
            }
            OutputFormat::Table => {
                write!(self.writer, "{}", table::render(report))?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> anyhow::Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("failed to flush output: {}", err.error()))
    }
}

fn or_absent<T: Display>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| ABSENT.to_string())
}

fn flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
