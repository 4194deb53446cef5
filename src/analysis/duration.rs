use crate::analysis::pair::FlowPair;
use crate::config::DetectionConfig;
use crate::flow::FlowRecord;

/// Fill in every record's duration and drop the ones shorter than
/// `floor_us`. Survivors keep their relative order.
pub fn eliminate_ephemeral(records: &mut Vec<FlowRecord>, floor_us: u64) {
    for record in records.iter_mut() {
        record.duration_us = record.compute_duration();
    }
    records.retain(|record| record.duration_us >= floor_us);
}

/// Pair up every two records whose durations and start times are close.
///
/// This is quadratic in the number of records, which is why ephemeral
/// flows are removed first.
pub fn candidate_pairs<'a>(
    records: &'a [FlowRecord],
    config: &DetectionConfig,
) -> Vec<FlowPair<'a>> {
    let mut pairs = Vec::new();

    for (i, first) in records.iter().enumerate() {
        for second in &records[i + 1..] {
            if first.duration_us.abs_diff(second.duration_us) >= config.duration_tolerance_us {
                continue;
            }

            let (Some(first_start), Some(second_start)) =
                (first.first_timestamp(), second.first_timestamp())
            else {
                continue;
            };
            if first_start.abs_diff(second_start) >= config.start_tolerance_us {
                continue;
            }

            if let Some(min_ratio) = config.min_size_ratio {
                if size_ratio(first, second) <= min_ratio {
                    continue;
                }
            }

            pairs.push(FlowPair::new(first, second));
        }
    }

    pairs
}

fn size_ratio(first: &FlowRecord, second: &FlowRecord) -> f64 {
    let larger = first.byte_count.max(second.byte_count);
    let smaller = first.byte_count.min(second.byte_count).max(1);
    larger as f64 / smaller as f64
}
