//! Outcome and option types for reconciliation runs

use hvclient::RetryConfig;
use serde::{Deserialize, Serialize};

/// Result of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Nothing needed changing
    NoChange,
    /// Disk was created
    Created,
    /// Disk was created, or an existing one adopted, with no earlier
    /// observation to tell which
    Ensured,
    /// Disk was destroyed and created again
    Replaced,
    /// Disk was resized in place
    Modified,
    /// Disk was deleted
    Removed,
    /// Cycle failed
    Failed { error: String },
    /// Cycle did not run
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub ensured: usize,
    pub replaced: usize,
    pub modified: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.ensured + self.replaced + self.modified + self.removed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of instances processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.skipped + self.failed + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Ensured => self.ensured += 1,
            ApplyResult::Replaced => self.replaced += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for batch execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Number of instances reconciled in parallel
    pub jobs: usize,
    /// Whole-cycle retry policy; never retries by default
    pub retry: RetryConfig,
    /// Cancel the remaining instances after the first failure
    pub fail_fast: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            retry: RetryConfig::no_retry(),
            fail_fast: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = ExecuteSummary::default();
        for result in [
            ApplyResult::Created,
            ApplyResult::Ensured,
            ApplyResult::Replaced,
            ApplyResult::NoChange,
            ApplyResult::Failed {
                error: "boom".into(),
            },
        ] {
            summary.add_result(&result);
        }

        assert_eq!(summary.total_changes(), 3);
        assert_eq!(summary.ensured, 1);
        assert_eq!(summary.total(), 5);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_default_options_do_not_retry() {
        let opts = ExecuteOptions::default();
        assert_eq!(opts.jobs, 4);
        assert_eq!(opts.retry.max_attempts, 1);
        assert!(!opts.fail_fast);
    }

    #[test]
    fn test_result_predicates() {
        assert!(
            ApplyResult::Skipped {
                reason: "cancelled".into()
            }
            .is_success()
        );
    }
}
