//! Period labels and block configuration.
//!
//! Schools group periods into blocks, usually of two periods each. Some mix blocks and
//! single periods ("abstract blocks"); in that case labels always fall back to periods.
//! Rendering only needs a label for a set of periods, so the renderer depends on the
//! [`PeriodLabels`] trait and not on a concrete configuration.

use crate::info::lesson::Period;
use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Human-readable label for a set of periods.
pub trait PeriodLabels {
    fn label_for_periods(&self, periods: &BTreeSet<Period>) -> String;
}

/// Labels periods the way plan notices write them: "St.3", "St.3-4".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanNotation;

impl PeriodLabels for PlanNotation {
    fn label_for_periods(&self, periods: &BTreeSet<Period>) -> String {
        let runs: Vec<String> = increasing_runs(periods)
            .into_iter()
            .map(|run| match run.as_slice() {
                [single] => single.to_string(),
                [first, .., last] => format!("{first}-{last}"),
                [] => String::new(),
            })
            .collect();
        format!("St.{}", runs.join(","))
    }
}

/// Mapping of logical block number to the periods it contains.
///
/// An empty configuration means the schedule consists of single periods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockConfiguration {
    blocks: BTreeMap<i32, Vec<Period>>,
}

impl BlockConfiguration {
    pub fn new(blocks: BTreeMap<i32, Vec<Period>>) -> Self {
        Self { blocks }
    }

    /// The configuration without blocks.
    pub fn trivial() -> Self {
        Self::default()
    }

    pub fn block_of_period(&self, period: Period) -> i32 {
        if let Some((block, _)) = self
            .blocks
            .iter()
            .find(|(_, periods)| periods.contains(&period))
        {
            return *block;
        }

        // Periods outside the configured range get a block of their own; plenty of
        // schools report periods beyond their last block.
        let max_block = self.blocks.keys().max().copied().unwrap_or(0);
        let min_block = self.blocks.keys().min().copied().unwrap_or(0);
        let max_period = max_of(&self.periods_of_block(max_block));
        let min_period = min_of(&self.periods_of_block(min_block));

        if period > min_period {
            max_block + (period - max_period)
        } else {
            min_block - (min_period - period)
        }
    }

    pub fn periods_of_block(&self, block: i32) -> Vec<Period> {
        if self.blocks.is_empty() {
            return vec![block];
        }

        if let Some(periods) = self.blocks.get(&block) {
            return periods.clone();
        }

        let max_block = self.blocks.keys().max().copied().unwrap_or(0);
        let min_block = self.blocks.keys().min().copied().unwrap_or(0);

        if block < min_block {
            let min_period = min_of(&self.periods_of_block(min_block));
            vec![block + min_block - min_period]
        } else {
            let max_period = max_of(&self.periods_of_block(max_block));
            vec![block - max_block + max_period]
        }
    }

    pub fn has_abstract_blocks(&self) -> bool {
        self.blocks.values().any(|periods| periods.len() == 1)
    }

    fn label_blocks(&self, periods: &BTreeSet<Period>) -> String {
        let blocks: BTreeSet<i32> = periods.iter().map(|p| self.block_of_period(*p)).collect();
        let runs = join_runs(&blocks);
        if blocks.len() == 1 {
            format!("Block {runs}")
        } else {
            format!("Blöcke {runs}")
        }
    }

    /// Derive blocks from the default start/end times of each period.
    ///
    /// Periods that follow each other without a break form a block; a single period
    /// starting at most five minutes after a preceding single period is merged into it.
    /// Falls back to the trivial configuration for gapped period numbering or blocks of
    /// more than two periods.
    pub fn from_default_times(times: &BTreeMap<Period, (NaiveTime, NaiveTime)>) -> Self {
        let (Some(first), Some(last)) = (times.keys().next(), times.keys().next_back()) else {
            return Self::trivial();
        };
        if (last - first + 1) as usize != times.len() {
            return Self::trivial();
        }

        let mut blocks: Vec<Vec<Period>> = Vec::new();
        let mut last_period_end: Option<NaiveTime> = None;
        for (period, (start, end)) in times {
            match blocks.last_mut() {
                Some(block) if last_period_end == Some(*start) => block.push(*period),
                _ => blocks.push(vec![*period]),
            }
            last_period_end = Some(*end);
        }

        let mut merged: Vec<Vec<Period>> = Vec::new();
        let mut last_block_end: Option<NaiveTime> = None;
        for block_periods in blocks {
            let Some((this_start, this_end)) =
                block_periods.last().and_then(|period| times.get(period))
            else {
                continue;
            };

            let merge = block_periods.len() == 1
                && last_block_end
                    .is_some_and(|end| *this_start - end <= TimeDelta::minutes(5));

            last_block_end = (block_periods.len() == 1).then_some(*this_end);

            match merged.last_mut() {
                Some(previous) if merge => previous.extend(block_periods),
                _ => merged.push(block_periods),
            }
        }

        if merged.iter().any(|block| block.len() > 2) {
            return Self::trivial();
        }

        Self::new(
            merged
                .into_iter()
                .enumerate()
                .map(|(i, periods)| (i as i32 + 1, periods))
                .collect(),
        )
    }
}

impl PeriodLabels for BlockConfiguration {
    fn label_for_periods(&self, periods: &BTreeSet<Period>) -> String {
        if self.blocks.is_empty() || self.has_abstract_blocks() {
            return label_periods(periods);
        }

        if periods
            .iter()
            .any(|p| self.periods_of_block(self.block_of_period(*p)).len() == 1)
        {
            return label_periods(periods);
        }

        let all_block_periods: BTreeSet<Period> = periods
            .iter()
            .flat_map(|p| self.periods_of_block(self.block_of_period(*p)))
            .collect();

        if all_block_periods.is_subset(periods) {
            self.label_blocks(periods)
        } else {
            label_periods(periods)
        }
    }
}

fn label_periods(periods: &BTreeSet<Period>) -> String {
    let runs = join_runs(periods);
    if periods.len() == 1 {
        format!("Stunde {runs}")
    } else {
        format!("Stunden {runs}")
    }
}

/// "1,2" for runs of two, "1-4" for longer runs, joined by commas.
fn join_runs(values: &BTreeSet<i32>) -> String {
    increasing_runs(values)
        .into_iter()
        .map(|run| match run.as_slice() {
            [single] => single.to_string(),
            [first, last] => format!("{first},{last}"),
            [first, .., last] => format!("{first}-{last}"),
            [] => String::new(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn increasing_runs(values: &BTreeSet<i32>) -> Vec<Vec<i32>> {
    let mut runs: Vec<Vec<i32>> = Vec::new();
    for value in values {
        match runs.last_mut() {
            Some(run) if run.last() == Some(&(value - 1)) => run.push(*value),
            _ => runs.push(vec![*value]),
        }
    }
    runs
}

fn max_of(periods: &[Period]) -> Period {
    periods.iter().max().copied().unwrap_or(0)
}

fn min_of(periods: &[Period]) -> Period {
    periods.iter().min().copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periods(values: &[Period]) -> BTreeSet<Period> {
        values.iter().copied().collect()
    }

    fn two_blocks() -> BlockConfiguration {
        BlockConfiguration::new(BTreeMap::from([(1, vec![1, 2]), (2, vec![3, 4])]))
    }

    #[test]
    fn test_empty_block_configuration() {
        let empty = BlockConfiguration::trivial();

        assert_eq!(empty.periods_of_block(0), vec![0]);
        assert_eq!(empty.periods_of_block(5), vec![5]);
        assert_eq!(empty.periods_of_block(-1), vec![-1]);
        assert_eq!(empty.block_of_period(0), 0);
        assert_eq!(empty.block_of_period(2), 2);
        assert_eq!(empty.block_of_period(-2), -2);
        assert_eq!(empty.label_for_periods(&periods(&[0])), "Stunde 0");
        assert_eq!(empty.label_for_periods(&periods(&[0, 1, 2, 3])), "Stunden 0-3");
    }

    #[test]
    fn test_out_of_bounds() {
        let config = two_blocks();

        assert_eq!(config.periods_of_block(1), vec![1, 2]);
        assert_eq!(config.periods_of_block(2), vec![3, 4]);
        assert_eq!(config.periods_of_block(0), vec![0]);
        assert_eq!(config.periods_of_block(-1), vec![-1]);
        assert_eq!(config.periods_of_block(3), vec![5]);
        assert_eq!(config.periods_of_block(4), vec![6]);

        assert_eq!(config.block_of_period(1), 1);
        assert_eq!(config.block_of_period(2), 1);
        assert_eq!(config.block_of_period(3), 2);
        assert_eq!(config.block_of_period(4), 2);
        assert_eq!(config.block_of_period(-1), -1);
        assert_eq!(config.block_of_period(0), 0);
        assert_eq!(config.block_of_period(5), 3);
        assert_eq!(config.block_of_period(6), 4);
    }

    #[test]
    fn test_labels() {
        let config = two_blocks();

        assert_eq!(config.label_for_periods(&periods(&[1, 2])), "Block 1");
        assert_eq!(config.label_for_periods(&periods(&[3, 4])), "Block 2");
        assert_eq!(config.label_for_periods(&periods(&[1, 2, 3, 4])), "Blöcke 1,2");
        assert_eq!(config.label_for_periods(&periods(&[1, 3])), "Stunden 1,3");
        assert_eq!(config.label_for_periods(&periods(&[1, 2, 3, 4, 5])), "Stunden 1-5");
        assert_eq!(
            config.label_for_periods(&periods(&[1, 2, 3, 4, 6])),
            "Stunden 1-4,6"
        );
        assert_eq!(config.label_for_periods(&periods(&[0])), "Stunde 0");
    }

    #[test]
    fn test_plan_notation() {
        assert_eq!(PlanNotation.label_for_periods(&periods(&[7])), "St.7");
        assert_eq!(PlanNotation.label_for_periods(&periods(&[3, 4])), "St.3-4");
        assert_eq!(PlanNotation.label_for_periods(&periods(&[1, 3])), "St.1,3");
    }

    #[test]
    fn test_from_default_times() {
        let t = |h: u32, m: u32| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        let times = BTreeMap::from([
            (1, (t(7, 30), t(8, 15))),
            (2, (t(8, 15), t(9, 0))),
            (3, (t(9, 20), t(10, 5))),
            (4, (t(10, 5), t(10, 50))),
            (5, (t(11, 20), t(12, 5))),
        ]);
        let config = BlockConfiguration::from_default_times(&times);
        assert_eq!(
            config,
            BlockConfiguration::new(BTreeMap::from([
                (1, vec![1, 2]),
                (2, vec![3, 4]),
                (3, vec![5]),
            ]))
        );
    }

    #[test]
    fn test_from_default_times_merges_close_singles() {
        let t = |h: u32, m: u32| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        let times = BTreeMap::from([
            (1, (t(7, 30), t(8, 15))),
            (2, (t(8, 20), t(9, 5))),
        ]);
        assert_eq!(
            BlockConfiguration::from_default_times(&times),
            BlockConfiguration::new(BTreeMap::from([(1, vec![1, 2])]))
        );
    }

    #[test]
    fn test_from_default_times_rejects_gaps() {
        let t = |h: u32, m: u32| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        let times = BTreeMap::from([(1, (t(7, 30), t(8, 15))), (3, (t(9, 20), t(10, 5)))]);
        assert_eq!(
            BlockConfiguration::from_default_times(&times),
            BlockConfiguration::trivial()
        );
    }
}
