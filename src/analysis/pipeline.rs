use crate::analysis::alternation::alternation_filter;
use crate::analysis::coherence::coherence_filter;
use crate::analysis::duration::{candidate_pairs, eliminate_ephemeral};
use crate::analysis::pair::FlowPair;
use crate::config::DetectionConfig;
use crate::flow::FlowRecord;

/// How many flows and pairs made it through each stage of one window.
#[derive(Debug)]
pub struct WindowVerdict<'a> {
    pub flows_observed: usize,
    pub flows_retained: usize,
    pub candidates: usize,
    pub alternating: usize,
    pub pivots: Vec<FlowPair<'a>>,
}

/// Duration, alternation and coherence filters applied in that order.
#[derive(Debug, Clone)]
pub struct PivotPipeline {
    config: DetectionConfig,
}

impl PivotPipeline {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run a detached window snapshot through all three filters.
    pub fn run<'a>(&self, records: &'a mut Vec<FlowRecord>) -> WindowVerdict<'a> {
        let flows_observed = records.len();
        eliminate_ephemeral(records, self.config.ephemeral_floor_us);
        let records: &'a [FlowRecord] = records;

        let mut pairs = candidate_pairs(records, &self.config);
        let candidates = pairs.len();

        alternation_filter(&mut pairs, self.config.merge_length, self.config.max_run_length);
        let alternating = pairs.len();

        coherence_filter(&mut pairs, self.config.merge_length);

        WindowVerdict {
            flows_observed,
            flows_retained: records.len(),
            candidates,
            alternating,
            pivots: pairs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Flow, FlowTable, Protocol};

    const STEP_US: u64 = 25_000;
    const BASE_US: u64 = 1_700_000_000_000_000;

    /// Two relay legs whose packets alternate, 200 packets in total, plus
    /// a short-lived third flow.
    fn relay_window() -> FlowTable {
        let table = FlowTable::new();
        let inbound = Flow::new("203.0.113.7", 51515, "10.0.0.5", 22, Protocol::Tcp);
        let outbound = Flow::new("10.0.0.5", 40222, "10.0.0.9", 22, Protocol::Tcp);
        let chatter = Flow::new("10.0.0.5", 5353, "224.0.0.251", 5353, Protocol::Udp);

        for i in 0..200u64 {
            let ts = BASE_US + i * STEP_US;
            let (leg, swap) = if i % 2 == 0 {
                (&inbound, i % 4 == 2)
            } else {
                (&outbound, i % 4 == 3)
            };
            let flow = if swap { leg.reversed() } else { leg.clone() };
            table.observe_flow(&flow, 120, ts);
        }
        for i in 0..3u64 {
            table.observe_flow(&chatter, 80, BASE_US + 1_000 + i * 500);
        }
        table
    }

    #[test]
    fn test_relay_is_detected_once() {
        let pipeline = PivotPipeline::new(DetectionConfig::default());
        let mut records = relay_window().take_snapshot();
        let verdict = pipeline.run(&mut records);

        assert_eq!(verdict.flows_observed, 3);
        assert_eq!(verdict.flows_retained, 2);
        assert_eq!(verdict.candidates, 1);
        assert_eq!(verdict.alternating, 1);
        assert_eq!(verdict.pivots.len(), 1);

        let pivot = verdict.pivots[0];
        assert_eq!(pivot.first.flow.src_ip, "203.0.113.7");
        assert_eq!(pivot.second.flow.dst_ip, "10.0.0.9");
        assert_eq!(pivot.first.packet_count, 100);
        assert_eq!(pivot.second.packet_count, 100);
    }

    #[test]
    fn test_short_flow_never_reported() {
        let mut config = DetectionConfig::default();
        config.ephemeral_floor_us = 0;
        config.start_tolerance_us = u64::MAX;
        config.duration_tolerance_us = u64::MAX;
        let pipeline = PivotPipeline::new(config);

        let mut records = relay_window().take_snapshot();
        let verdict = pipeline.run(&mut records);

        for pivot in &verdict.pivots {
            assert_ne!(pivot.first.flow.dst_port, 5353);
            assert_ne!(pivot.second.flow.dst_port, 5353);
        }
        assert_eq!(verdict.pivots.len(), 1);
    }

    #[test]
    fn test_bursty_legs_are_not_reported() {
        let table = FlowTable::new();
        let inbound = Flow::new("203.0.113.7", 51515, "10.0.0.5", 22, Protocol::Tcp);
        let outbound = Flow::new("10.0.0.5", 40222, "10.0.0.9", 22, Protocol::Tcp);
        // Each leg sends ten packets before the other answers.
        for i in 0..200u64 {
            let leg = if (i / 10) % 2 == 0 { &inbound } else { &outbound };
            table.observe_flow(leg, 120, BASE_US + i * STEP_US);
        }

        let pipeline = PivotPipeline::new(DetectionConfig::default());
        let mut records = table.take_snapshot();
        let verdict = pipeline.run(&mut records);

        assert_eq!(verdict.candidates, 1);
        assert_eq!(verdict.alternating, 0);
        assert!(verdict.pivots.is_empty());
    }

    #[test]
    fn test_empty_window() {
        let pipeline = PivotPipeline::new(DetectionConfig::default());
        let mut records = Vec::new();
        let verdict = pipeline.run(&mut records);
        assert_eq!(verdict.flows_observed, 0);
        assert!(verdict.pivots.is_empty());
    }
}
