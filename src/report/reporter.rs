use serde::Serialize;
use std::io::{self, Write};
use crate::analysis::FlowPair;
use crate::config::ReportFormat;
use crate::flow::{FlowId, FlowRecord, Protocol};

/// Writes surviving pivot pairs, one line each.
pub struct Reporter<W: Write> {
    out: W,
    format: ReportFormat,
}

#[derive(Serialize)]
struct PivotEvent<'a> {
    window: u64,
    first: LegReport<'a>,
    second: LegReport<'a>,
}

#[derive(Serialize)]
struct LegReport<'a> {
    id: FlowId,
    src_ip: &'a str,
    src_port: u16,
    dst_ip: &'a str,
    dst_port: u16,
    protocol: Protocol,
    packets: u64,
    bytes: u64,
    duration_us: u64,
}

impl<'a> From<&'a FlowRecord> for LegReport<'a> {
    fn from(record: &'a FlowRecord) -> Self {
        Self {
            id: record.id,
            src_ip: &record.flow.src_ip,
            src_port: record.flow.src_port,
            dst_ip: &record.flow.dst_ip,
            dst_port: record.flow.dst_port,
            protocol: record.flow.protocol,
            packets: record.packet_count,
            bytes: record.byte_count,
            duration_us: record.duration_us,
        }
    }
}

/// `PIVOT!: a:p <-> b:q | c:r <-> d:s`, each flow in the direction its
/// first packet travelled.
pub fn pivot_line(pair: &FlowPair<'_>) -> String {
    format!("PIVOT!: {}", pair)
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self { out, format }
    }

    pub fn report(&mut self, window: u64, pairs: &[FlowPair<'_>]) -> io::Result<()> {
        for pair in pairs {
            match self.format {
                ReportFormat::Text => writeln!(self.out, "{}", pivot_line(pair))?,
                ReportFormat::Json => {
                    let event = PivotEvent {
                        window,
                        first: pair.first.into(),
                        second: pair.second.into(),
                    };
                    serde_json::to_writer(&mut self.out, &event)?;
                    writeln!(self.out)?;
                }
            }
        }
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
