//! Per-user statistics over a reporting window.

use crate::config::{ReportConfig, DATE_FORMAT};
use crate::errors::{GitHubError, GitHubResult};
use crate::types::{Member, PullRequestRecord, UserStats};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;

/// Aggregated stats keyed by username.
pub type StatsTable = BTreeMap<String, UserStats>;

/// Reporting window.
///
/// Activity counts when it happened strictly after `start` and no later
/// than `end`. Pull request listings are not traversed past `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    /// Exclusive lower bound.
    pub start: DateTime<Utc>,
    /// Inclusive upper bound.
    pub end: DateTime<Utc>,
    /// Pull request traversal cutoff.
    pub base: DateTime<Utc>,
}

impl ReportWindow {
    /// Resolves the configured dates. `end` is the day after `END_DATE`
    /// (or after `today` when unset) so the whole last day is included.
    ///
    /// Fails with a configuration error when a bound leaves the calendar
    /// range.
    pub fn from_config(report: &ReportConfig, today: NaiveDate) -> GitHubResult<Self> {
        let last = report.end_date.unwrap_or(today);
        let end = last
            .checked_add_days(Days::new(1))
            .ok_or_else(|| GitHubError::configuration(format!("END_DATE out of range: {}", last)))?;
        let base = report
            .start_date
            .checked_sub_days(Days::new(report.base_days.unsigned_abs()))
            .ok_or_else(|| {
                GitHubError::configuration(format!("BASE out of range: {}", report.base_days))
            })?;

        Ok(Self {
            start: midnight(report.start_date),
            end: midnight(end),
            base: midnight(base),
        })
    }

    /// Name of the CSV file the report is written to.
    pub fn filename(&self) -> String {
        format!(
            "results_{}_to_{}.csv",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }

    /// Returns true if `at` falls inside the window.
    pub fn contains(&self, at: Option<DateTime<Utc>>) -> bool {
        at.map_or(false, |t| self.start < t && t <= self.end)
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

/// Builds per-user totals.
///
/// Reviews are credited to their reviewer even when the pull request itself
/// falls outside the window. Members without activity get a zeroed row.
pub fn aggregate(prs: &[PullRequestRecord], members: &[Member], window: &ReportWindow) -> StatsTable {
    let mut stats = StatsTable::new();

    for pr in prs {
        for review in pr.reviews.iter().filter(|r| window.contains(r.submitted_at)) {
            let entry = stats
                .entry(review.username.clone())
                .or_insert_with(|| UserStats::new(review.user_id, &review.username));
            entry.pull_requests_reviewed += 1;
        }

        if !window.contains(pr.created_at) {
            continue;
        }

        let entry = stats
            .entry(pr.username.clone())
            .or_insert_with(|| UserStats::new(pr.user_id, &pr.username));
        entry.pull_requests_created += 1;
        entry.additions += pr.additions;
        entry.deletions += pr.deletions;
        entry.changed_files += pr.changed_files;
        entry.commits += pr.commits;
        entry.reviews_on_pull_requests += pr.reviews.len() as u64;
    }

    for member in members {
        stats
            .entry(member.username.clone())
            .or_insert_with(|| UserStats::new(member.id, &member.username));
    }

    stats
}
