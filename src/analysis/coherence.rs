use crate::analysis::merge::merge_labels;
use crate::analysis::pair::FlowPair;
use crate::flow::FlowId;

/// Whether both labels occur in each of the four quarters of `labels`.
///
/// Quarters are `len / 4` long and the last one takes the remainder, so
/// with fewer than four labels the leading quarters are empty and the
/// answer is always `false`.
pub fn present_in_every_quarter(labels: &[FlowId], first: FlowId, second: FlowId) -> bool {
    let quarter = labels.len() / 4;
    let bounds = [
        (0, quarter),
        (quarter, quarter * 2),
        (quarter * 2, quarter * 3),
        (quarter * 3, labels.len()),
    ];

    bounds.iter().all(|&(start, end)| {
        let slice = &labels[start..end];
        slice.contains(&first) && slice.contains(&second)
    })
}

/// Keep only pairs whose two legs stay active across the whole merged
/// window, not just at one end of it.
pub fn coherence_filter(pairs: &mut Vec<FlowPair<'_>>, merge_length: usize) {
    pairs.retain(|pair| {
        let (first, second) = pair.ids();
        present_in_every_quarter(&merge_labels(pair, merge_length), first, second)
    });
}
