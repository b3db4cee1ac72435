use crate::data::{Match, RankTally, Ranks, UnmatchedMentee};
use itertools::Itertools;
use log::{info, warn};

/// Counts matches per rank value, one entry per configured rank in ascending order.
pub fn tally(matches: &[Match], ranks: &Ranks) -> Vec<RankTally> {
    let counts = matches.iter().map(|m| m.rank).counts();

    ranks
        .values()
        .iter()
        .zip(Ranks::LABELS)
        .map(|(&rank, label)| RankTally {
            label: label.to_string(),
            rank,
            count: counts.get(&rank).copied().unwrap_or(0),
        })
        .collect()
}

pub fn log_summary(summary: &[RankTally], unmatched: &[UnmatchedMentee]) {
    if !unmatched.is_empty() {
        warn!(
            "{} mentees unmatched due to insufficient mentor capacity: {}",
            unmatched.len(),
            unmatched.iter().map(|m| &m.name).join(", ")
        );
    }
    for line in summary {
        info!("{}", line);
    }
}
