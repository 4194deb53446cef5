use crate::analysis::pair::FlowPair;
use crate::flow::FlowId;

/// Interleave the two flows' packet arrivals, newest first, and return
/// whose packet each slot was. At most `limit` labels are produced.
///
/// Walks both timestamp lists backwards from their last packet. When the
/// two current timestamps are equal the first flow's packet is taken.
/// Once one flow runs out, the rest come from the other without comparing.
pub fn merge_labels(pair: &FlowPair<'_>, limit: usize) -> Vec<FlowId> {
    let first = &pair.first.timestamps;
    let second = &pair.second.timestamps;
    let (first_id, second_id) = pair.ids();

    let mut merged = Vec::with_capacity(limit.min(first.len() + second.len()));
    let mut i = first.len();
    let mut j = second.len();

    while merged.len() < limit && i > 0 && j > 0 {
        if first[i - 1] < second[j - 1] {
            merged.push(second_id);
            j -= 1;
        } else {
            merged.push(first_id);
            i -= 1;
        }
    }

    let remaining = limit - merged.len();
    if i > 0 {
        merged.extend(std::iter::repeat(first_id).take(i.min(remaining)));
    } else {
        merged.extend(std::iter::repeat(second_id).take(j.min(remaining)));
    }

    merged
}
