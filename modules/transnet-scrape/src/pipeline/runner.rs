//! The dispatch loop.
//!
//! Phases run strictly in order behind a hard barrier: phase N+1 never
//! starts until phase N has attempted its entire iteration set. Starting
//! at `start_phase` skips everything before it — earlier phases' output
//! is assumed persisted, which is the resumability contract.

use anyhow::Result;
use tracing::info;

use transnet_common::ScrapeConfig;

use super::phases::{phases, PhaseContext};
use super::stats::PipelineResult;
use crate::traits::{GraphStore, RemoteGraphSource};

pub struct PhaseRunner<'a> {
    store: &'a dyn GraphStore,
    source: &'a dyn RemoteGraphSource,
    config: ScrapeConfig,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(
        store: &'a dyn GraphStore,
        source: &'a dyn RemoteGraphSource,
        config: ScrapeConfig,
    ) -> Self {
        Self {
            store,
            source,
            config,
        }
    }

    /// Run every phase from `start_phase` (0-based) through the end of
    /// the pipeline. Fails only when the root account cannot be
    /// resolved; item failures are reported, not raised.
    pub async fn run(&self, start_phase: usize) -> Result<PipelineResult> {
        self.run_span(start_phase, phases().len()).await
    }

    /// Run phases `[start_phase, end_phase)`. Lets callers stop after an
    /// arbitrary phase and resume later from the next one.
    pub async fn run_span(&self, start_phase: usize, end_phase: usize) -> Result<PipelineResult> {
        let all = phases();
        let end_phase = end_phase.min(all.len());

        let ctx = PhaseContext {
            store: self.store,
            source: self.source,
            config: &self.config,
        };

        let mut result = PipelineResult::default();
        for (index, phase) in all.iter().enumerate().take(end_phase).skip(start_phase) {
            info!(phase = index, name = phase.name(), "Phase starting");
            let report = phase.execute(&ctx).await?;
            info!(
                phase = index,
                name = phase.name(),
                attempted = report.attempted,
                completed = report.completed,
                failed = report.failed,
                "Phase complete"
            );
            result.reports.push(report);
        }
        Ok(result)
    }
}
