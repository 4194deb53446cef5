use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Write;
use std::sync::Arc;
use crate::analysis::pipeline::PivotPipeline;
use crate::flow::{FlowRecord, FlowTable};
use crate::report::Reporter;
use crate::utils::formatting::{format_bytes, format_micros};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSummary {
    pub window: u64,
    pub packets: u64,
    pub bytes: u64,
    pub flows_observed: usize,
    pub flows_retained: usize,
    pub candidates: usize,
    pub alternating: usize,
    pub pivots: usize,
}

/// Periodically swaps out the live flow table and analyzes what it held.
///
/// Each window is analyzed on its own; nothing carries over.
pub struct WindowScheduler<W: Write> {
    table: Arc<FlowTable>,
    pipeline: PivotPipeline,
    reporter: Reporter<W>,
    window: u64,
}

impl<W: Write> WindowScheduler<W> {
    pub fn new(table: Arc<FlowTable>, pipeline: PivotPipeline, reporter: Reporter<W>) -> Self {
        Self {
            table,
            pipeline,
            reporter,
            window: 0,
        }
    }

    /// Analyze one detached snapshot and report its pivots.
    pub fn process_window(&mut self, mut records: Vec<FlowRecord>) -> Result<WindowSummary> {
        self.window += 1;
        let packets = records.iter().map(|r| r.packet_count).sum();
        let bytes = records.iter().map(|r| r.byte_count).sum();

        let verdict = self.pipeline.run(&mut records);
        self.reporter
            .report(self.window, &verdict.pivots)
            .with_context(|| format!("Failed to report window {}", self.window))?;

        for pivot in &verdict.pivots {
            debug!(
                "Window {}: pivot {} / {} lasting {} and {}",
                self.window,
                pivot.first.id,
                pivot.second.id,
                format_micros(pivot.first.duration_us),
                format_micros(pivot.second.duration_us)
            );
        }

        let summary = WindowSummary {
            window: self.window,
            packets,
            bytes,
            flows_observed: verdict.flows_observed,
            flows_retained: verdict.flows_retained,
            candidates: verdict.candidates,
            alternating: verdict.alternating,
            pivots: verdict.pivots.len(),
        };

        info!(
            "Window {}: {} packets ({}), {} flows, {} long-lived, {} candidates, {} alternating, {} pivots",
            summary.window,
            summary.packets,
            format_bytes(summary.bytes),
            summary.flows_observed,
            summary.flows_retained,
            summary.candidates,
            summary.alternating,
            summary.pivots
        );

        Ok(summary)
    }

    pub fn reporter(&self) -> &Reporter<W> {
        &self.reporter
    }
}

impl<W: Write + Send + 'static> WindowScheduler<W> {
    /// Sleep a window, detach the table, analyze, repeat. Only returns if
    /// writing a report fails.
    ///
    /// Analysis runs on the blocking pool so the caller's other branches
    /// (shutdown signal, capture exit) stay responsive during a long window.
    pub async fn run(mut self) -> Result<()> {
        let period = self.pipeline.config().window();
        info!("Analyzing flows every {}s", period.as_secs());

        loop {
            tokio::time::sleep(period).await;
            let snapshot = self.table.take_snapshot();
            let (scheduler, result) = tokio::task::spawn_blocking(move || {
                let result = self.process_window(snapshot);
                (self, result)
            })
            .await
            .context("Window analysis task failed")?;
            self = scheduler;
            result?;
        }
    }
}
