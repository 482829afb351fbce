//! Per-view orchestration.
//!
//! Selects the datasets feeding each view, merges them when needed, and runs
//! resolve → filter → aggregate under the global filter state.

use super::aggregator::aggregate;
use super::filter::FilterEngine;
use super::merge::merge_labeled;
use super::schema::SchemaResolver;
use crate::config::SchemaConfig;
use crate::models::{
    Dataset, FilterState, LegalizationKind, NoDataReason, ReportView, SourceKind, ViewOutcome,
    ViewReport, ViewSection,
};
use crate::state::Snapshot;
use std::borrow::Cow;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Computes view outcomes from a snapshot.
pub struct Orchestrator {
    resolver: SchemaResolver,
    category_field: String,
    day_first: bool,
}

impl Orchestrator {
    pub fn new(config: &SchemaConfig) -> Self {
        Self {
            resolver: SchemaResolver::new(config),
            category_field: config.category_field.clone(),
            day_first: config.day_first,
        }
    }

    /// Compute every requested view, in the order given.
    pub fn compute_views(
        &self,
        snapshot: &Snapshot,
        views: &[ReportView],
        filters: &FilterState,
    ) -> Vec<ViewSection> {
        views
            .iter()
            .map(|&view| ViewSection {
                view,
                title: view.title().to_string(),
                outcome: self.compute_view(snapshot, view, filters),
            })
            .collect()
    }

    /// Compute a single view.
    pub fn compute_view(
        &self,
        snapshot: &Snapshot,
        view: ReportView,
        filters: &FilterState,
    ) -> ViewOutcome {
        let outcome = match self.view_input(snapshot, view) {
            Some(dataset) => {
                self.process(&dataset, view == ReportView::Legalizaciones, filters)
            }
            None => ViewOutcome::NoData {
                reason: NoDataReason::NotSynchronized,
            },
        };
        info!("{}: {}", view.title(), describe(&outcome));
        outcome
    }

    /// Run the pipeline on one dataset.
    ///
    /// The category stage only applies to `categorized` input, i.e. the
    /// merged legalizations.
    pub fn process(
        &self,
        dataset: &Dataset,
        categorized: bool,
        filters: &FilterState,
    ) -> ViewOutcome {
        if dataset.is_empty() {
            return ViewOutcome::NoData {
                reason: NoDataReason::NoRows,
            };
        }

        let schema = match self.resolver.resolve(dataset, categorized) {
            Ok(schema) => schema,
            Err(e) => {
                warn!("Cannot process dataset: {}", e);
                return ViewOutcome::CannotProcess {
                    reason: e.to_string(),
                };
            }
        };
        debug!("Resolved schema: {:?}", schema);

        let filtered = FilterEngine::new(&schema, self.day_first).apply(dataset, filters);
        if filtered.is_empty() {
            return ViewOutcome::EmptyAfterFilter;
        }

        ViewOutcome::Ready(ViewReport {
            total_records: filtered.rows.len(),
            result: aggregate(&filtered.rows, filtered.operator_filter_active),
        })
    }

    /// The dataset a view reads: merged legalizations, or a single source.
    fn view_input<'a>(&self, snapshot: &'a Snapshot, view: ReportView) -> Option<Cow<'a, Dataset>> {
        match view {
            ReportView::Legalizaciones => {
                let sources: Vec<(&str, &Dataset)> = LegalizationKind::ALL
                    .iter()
                    .filter_map(|kind| snapshot.get(kind.source()).map(|d| (kind.label(), d)))
                    .collect();
                merge_labeled(&sources, &self.category_field).map(Cow::Owned)
            }
            ReportView::Rips => snapshot.get(SourceKind::Rips).map(Cow::Borrowed),
            ReportView::Facturacion => snapshot.get(SourceKind::Facturacion).map(Cow::Borrowed),
        }
    }

    /// Every non-empty operator name across all loaded sources.
    pub fn known_operators(&self, snapshot: &Snapshot) -> BTreeSet<String> {
        let mut operators = BTreeSet::new();

        for (kind, dataset) in snapshot.iter() {
            let Some(field) = self.resolver.operator_field(dataset) else {
                debug!("{} has no operator column", kind);
                continue;
            };
            operators.extend(dataset.records.iter().filter_map(|r| r.text(&field)));
        }

        operators
    }
}

fn describe(outcome: &ViewOutcome) -> String {
    match outcome {
        ViewOutcome::NoData {
            reason: NoDataReason::NotSynchronized,
        } => "not synchronized".to_string(),
        ViewOutcome::NoData {
            reason: NoDataReason::NoRows,
        } => "no rows".to_string(),
        ViewOutcome::CannotProcess { reason } => format!("cannot process ({})", reason),
        ViewOutcome::EmptyAfterFilter => "no rows match the filters".to_string(),
        ViewOutcome::Ready(report) => format!("{} records", report.total_records),
    }
}
