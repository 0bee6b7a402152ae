//! Progress observation for migration runs.

use crate::migration::{MigrationReport, Progress};
use rekey_graph::Iri;
use tracing::{debug, info, trace};

/// Receives batch, per-resource and summary events from the engine.
///
/// All hooks default to no-ops.
pub trait MigrationObserver {
    fn on_batch_selected(&mut self, _old_namespace: &str, _batch: &[Iri]) {}

    fn on_progress(&mut self, _progress: &Progress) {}

    fn on_complete(&mut self, _report: &MigrationReport) {}
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl MigrationObserver for NullObserver {}

/// Emits events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver {
    per_resource_info: bool,
}

impl TracingObserver {
    /// Log each rename at `info` instead of `debug`.
    pub fn per_resource_info(mut self, enabled: bool) -> Self {
        self.per_resource_info = enabled;
        self
    }
}

impl MigrationObserver for TracingObserver {
    fn on_batch_selected(&mut self, old_namespace: &str, batch: &[Iri]) {
        debug!(old_namespace, resources = batch.len(), "selected migration batch");
    }

    fn on_progress(&mut self, progress: &Progress) {
        trace!(
            "({}/{}: {}%): renamed <{}>",
            progress.index, progress.total, progress.percent, progress.old_id
        );
        if self.per_resource_info {
            info!(old = %progress.old_id, new = %progress.new_id, "resource renamed");
        } else {
            debug!(old = %progress.old_id, new = %progress.new_id, "resource renamed");
        }
    }

    fn on_complete(&mut self, report: &MigrationReport) {
        info!(
            run_id = %report.run_id,
            statements = report.statements_rewritten,
            equivalences = report.equivalences_added,
            "changed namespace for {} resources",
            report.renamed
        );
    }
}
