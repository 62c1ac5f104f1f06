//! Per-phase accounting and the end-of-run summary.

/// Outcome of one phase: how many items its iteration set held, how many
/// were fully persisted, how many were skipped after an item failure.
/// Filter phases also report how many accounts they tagged.
#[derive(Debug, Default)]
pub struct PhaseReport {
    pub phase: &'static str,
    pub attempted: u32,
    pub completed: u32,
    pub failed: u32,
    pub tagged: u32,
}

impl PhaseReport {
    pub fn new(phase: &'static str) -> Self {
        Self {
            phase,
            ..Self::default()
        }
    }

    /// Record one attempted item.
    pub fn record(&mut self, ok: bool) {
        self.attempted += 1;
        if ok {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Reports for every phase that executed, in order.
#[derive(Debug, Default)]
pub struct PipelineResult {
    pub reports: Vec<PhaseReport>,
}

impl PipelineResult {
    /// True when every attempted item in every phase completed.
    pub fn clean(&self) -> bool {
        self.reports.iter().all(|r| r.failed == 0)
    }
}

impl std::fmt::Display for PipelineResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Scrape Run Complete ===")?;
        for r in &self.reports {
            write!(
                f,
                "{:<20} attempted {:>5}  completed {:>5}  failed {:>5}",
                r.phase, r.attempted, r.completed, r.failed
            )?;
            if r.tagged > 0 {
                write!(f, "  tagged {:>5}", r.tagged)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_splits_completed_and_failed() {
        let mut report = PhaseReport::new("sample-graph-pull");
        report.record(true);
        report.record(false);
        report.record(true);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.completed, 2);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn clean_requires_zero_failures() {
        let mut result = PipelineResult::default();
        let mut ok = PhaseReport::new("root-fetch");
        ok.record(true);
        result.reports.push(ok);
        assert!(result.clean());

        let mut bad = PhaseReport::new("status-pull");
        bad.record(false);
        result.reports.push(bad);
        assert!(!result.clean());
    }

    #[test]
    fn summary_lists_each_phase() {
        let mut result = PipelineResult::default();
        let mut r = PhaseReport::new("filter-pass-0");
        r.record(true);
        r.tagged = 1;
        result.reports.push(r);
        let rendered = format!("{result}");
        assert!(rendered.contains("=== Scrape Run Complete ==="));
        assert!(rendered.contains("filter-pass-0"));
        assert!(rendered.contains("tagged"));
    }
}
