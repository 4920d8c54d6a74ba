//! Selection-rate fairness report
//!
//! Compares how often each applicant group is selected. A group whose
//! selection rate falls below [`FOUR_FIFTHS_THRESHOLD`] of the best group's
//! rate is flagged (the "four-fifths rule"). This is arithmetic over counts,
//! not a bias model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum acceptable impact ratio
pub const FOUR_FIFTHS_THRESHOLD: f64 = 0.8;

/// Label used for outcomes without a group
pub const UNSPECIFIED_GROUP: &str = "unspecified";

/// One applicant's outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub group: Option<String>,
    pub selected: bool,
}

impl Outcome {
    pub fn new(group: Option<&str>, selected: bool) -> Self {
        Self {
            group: group.map(str::to_string),
            selected,
        }
    }
}

/// Per-group counts before rates are derived
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub applicants: u64,
    pub selected: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub group: String,
    pub applicants: u64,
    pub selected: u64,
    pub selection_rate: f64,
    /// `selection_rate / highest_rate` (1 when nobody was selected)
    pub impact_ratio: f64,
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    /// Sorted by group label
    pub groups: Vec<GroupStats>,
    pub total_applicants: u64,
    pub highest_rate: f64,
    pub lowest_rate: f64,
    /// `highest_rate - lowest_rate`
    pub parity_difference: f64,
    pub min_impact_ratio: f64,
    pub adverse_impact: bool,
}

/// Build the fairness report for a set of outcomes
pub fn fairness_report<'a, I>(outcomes: I) -> FairnessReport
where
    I: IntoIterator<Item = &'a Outcome>,
{
    let mut counts: BTreeMap<String, GroupOutcome> = BTreeMap::new();

    for outcome in outcomes {
        let label = outcome
            .group
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or(UNSPECIFIED_GROUP)
            .to_string();

        let entry = counts.entry(label).or_default();
        entry.applicants += 1;
        if outcome.selected {
            entry.selected += 1;
        }
    }

    report_from_counts(counts)
}

/// Build the report from pre-aggregated counts (e.g. a GROUP BY query)
pub fn report_from_counts(counts: BTreeMap<String, GroupOutcome>) -> FairnessReport {
    let rates: Vec<(String, GroupOutcome, f64)> = counts
        .into_iter()
        .filter(|(_, c)| c.applicants > 0)
        .map(|(group, c)| {
            let rate = c.selected.min(c.applicants) as f64 / c.applicants as f64;
            (group, c, rate)
        })
        .collect();

    if rates.is_empty() {
        return FairnessReport {
            groups: Vec::new(),
            total_applicants: 0,
            highest_rate: 0.0,
            lowest_rate: 0.0,
            parity_difference: 0.0,
            min_impact_ratio: 1.0,
            adverse_impact: false,
        };
    }

    let highest_rate = rates.iter().map(|(_, _, r)| *r).fold(0.0, f64::max);
    let lowest_rate = rates.iter().map(|(_, _, r)| *r).fold(1.0, f64::min);

    let groups: Vec<GroupStats> = rates
        .into_iter()
        .map(|(group, c, rate)| {
            let impact_ratio = if highest_rate > 0.0 { rate / highest_rate } else { 1.0 };
            GroupStats {
                group,
                applicants: c.applicants,
                selected: c.selected.min(c.applicants),
                selection_rate: rate,
                impact_ratio,
                flagged: impact_ratio < FOUR_FIFTHS_THRESHOLD,
            }
        })
        .collect();

    let min_impact_ratio = groups.iter().map(|g| g.impact_ratio).fold(1.0, f64::min);

    FairnessReport {
        total_applicants: groups.iter().map(|g| g.applicants).sum(),
        highest_rate,
        lowest_rate,
        parity_difference: highest_rate - lowest_rate,
        min_impact_ratio,
        adverse_impact: groups.iter().any(|g| g.flagged),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(group: &str, selected: usize, rejected: usize) -> Vec<Outcome> {
        let mut out = vec![Outcome::new(Some(group), true); selected];
        out.extend(vec![Outcome::new(Some(group), false); rejected]);
        out
    }

    #[test]
    fn test_equal_rates_no_adverse_impact() {
        let mut all = outcomes("a", 2, 2);
        all.extend(outcomes("b", 5, 5));

        let report = fairness_report(&all);
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.total_applicants, 14);
        assert!((report.min_impact_ratio - 1.0).abs() < 1e-9);
        assert_eq!(report.parity_difference, 0.0);
        assert!(!report.adverse_impact);
    }

    #[test]
    fn test_half_rate_group_flagged() {
        let mut all = outcomes("a", 6, 4); // 0.6
        all.extend(outcomes("b", 3, 7)); // 0.3

        let report = fairness_report(&all);
        let b = report.groups.iter().find(|g| g.group == "b").unwrap();
        assert!((b.impact_ratio - 0.5).abs() < 1e-9);
        assert!(b.flagged);
        assert!(report.adverse_impact);
        assert!((report.parity_difference - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_missing_group_is_unspecified() {
        let all = vec![Outcome::new(None, true), Outcome::new(Some("  "), false)];
        let report = fairness_report(&all);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].group, UNSPECIFIED_GROUP);
        assert_eq!(report.groups[0].applicants, 2);
    }

    #[test]
    fn test_nobody_selected() {
        let mut all = outcomes("a", 0, 3);
        all.extend(outcomes("b", 0, 2));
        let report = fairness_report(&all);
        assert!(!report.adverse_impact);
        assert_eq!(report.min_impact_ratio, 1.0);
    }

    #[test]
    fn test_empty_input() {
        let report = fairness_report(&[]);
        assert!(report.groups.is_empty());
        assert!(!report.adverse_impact);
        assert_eq!(report.min_impact_ratio, 1.0);
    }
}
