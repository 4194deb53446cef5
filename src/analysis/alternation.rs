use crate::analysis::merge::merge_labels;
use crate::analysis::pair::FlowPair;
use crate::flow::FlowId;

/// Length of the longest stretch of identical consecutive labels.
pub fn longest_run(labels: &[FlowId]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;

    for label in labels {
        if previous == Some(label) {
            current += 1;
        } else {
            current = 1;
            previous = Some(label);
        }
        longest = longest.max(current);
    }

    longest
}

/// Drop pairs where one side sends more than `max_run` packets in a row
/// without the other side answering. A relay keeps both legs interleaved.
pub fn alternation_filter(pairs: &mut Vec<FlowPair<'_>>, merge_length: usize, max_run: usize) {
    pairs.retain(|pair| longest_run(&merge_labels(pair, merge_length)) <= max_run);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Flow, FlowRecord, Protocol};

    fn record(id: u64, timestamps: &[u64]) -> FlowRecord {
        let flow = Flow::new("10.0.0.1", 40000, "10.0.0.2", 22, Protocol::Tcp);
        let mut record = FlowRecord::new(FlowId(id), flow);
        for ts in timestamps {
            record.record_packet(60, *ts);
        }
        record
    }

    #[test]
    fn test_longest_run() {
        let a = FlowId(1);
        let b = FlowId(2);
        assert_eq!(longest_run(&[]), 0);
        assert_eq!(longest_run(&[a]), 1);
        assert_eq!(longest_run(&[a, b, a, b]), 1);
        assert_eq!(longest_run(&[a, a, b, b, b, a]), 3);
        assert_eq!(longest_run(&[b, a, a, a, a]), 4);
    }

    #[test]
    fn test_run_above_bound_is_rejected() {
        // Merged newest first: B, then six A packets, then B.
        let bursty = record(1, &[10, 20, 30, 40, 50, 60]);
        let other = record(2, &[5, 70]);
        let mut pairs = vec![FlowPair::new(&bursty, &other)];

        alternation_filter(&mut pairs, 200, 5);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_run_at_bound_survives() {
        let bursty = record(1, &[20, 30, 40, 50, 60]);
        let other = record(2, &[5, 70]);
        let mut pairs = vec![FlowPair::new(&bursty, &other)];

        alternation_filter(&mut pairs, 200, 5);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_survivors_keep_order() {
        let a = record(1, &[1, 3, 5]);
        let b = record(2, &[2, 4, 6]);
        let burst = record(3, &[7, 8, 9, 10, 11, 12, 13]);
        let mut pairs = vec![
            FlowPair::new(&a, &b),
            FlowPair::new(&a, &burst),
            FlowPair::new(&b, &a),
        ];

        alternation_filter(&mut pairs, 200, 5);
        let ids: Vec<_> = pairs.iter().map(|p| p.ids()).collect();
        assert_eq!(ids, vec![(FlowId(1), FlowId(2)), (FlowId(2), FlowId(1))]);
    }

    #[test]
    fn test_only_recent_packets_count() {
        // The early burst falls outside the merge window.
        let early_burst = record(1, &[1, 2, 3, 4, 5, 6, 7, 8, 100, 102]);
        let steady = record(2, &[101, 103]);
        let mut pairs = vec![FlowPair::new(&early_burst, &steady)];

        alternation_filter(&mut pairs, 4, 1);
        assert_eq!(pairs.len(), 1);
    }
}
