use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::error::Result;
use crate::filter::{self, FilterRequest, Filters};
use crate::insights;
use crate::loader::{self, RawTable, Source};
use crate::metrics;
use crate::models::{ChannelMetrics, Dataset, FunnelStep, Insights, KpiSet, TrendPoint};
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineWarning {
    EmptyFilterResult,
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::EmptyFilterResult => {
                f.write_str("no rows match the selected date range and channels")
            }
        }
    }
}

/// Everything the presentation layer renders for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub filters: Option<Filters>,
    pub row_count: usize,
    pub kpis: KpiSet,
    pub funnel: Vec<FunnelStep>,
    pub trend: Vec<TrendPoint>,
    pub channels: Vec<ChannelMetrics>,
    pub insights: Insights,
    pub warnings: Vec<PipelineWarning>,
}

/// Loads a source and validates it into typed records.
pub fn prepare(source: &Source) -> Result<Dataset> {
    match source {
        Source::Sample => prepare_table(loader::load_sample()?),
        Source::File(path) => prepare_table(&loader::load_path(path)?),
    }
}

pub fn prepare_table(table: &RawTable) -> Result<Dataset> {
    let dataset = validate::validate(table)?;
    info!(rows = dataset.len(), "dataset validated");
    Ok(dataset)
}

/// Recomputes the full dashboard from scratch for one filter selection.
pub fn run(dataset: &Dataset, request: &FilterRequest) -> Dashboard {
    let span = info_span!("pipeline", rows = dataset.len());
    let _guard = span.enter();

    let filters = request.resolve(dataset);
    let filtered = match &filters {
        Some(f) => filter::apply(dataset, f),
        None => Dataset::default(),
    };
    info!(rows = filtered.len(), "rows after filter");

    let mut warnings = Vec::new();
    if filtered.is_empty() {
        warn!("filter selection matched no rows");
        warnings.push(PipelineWarning::EmptyFilterResult);
    }

    let funnel = metrics::funnel(&filtered);
    let channels = metrics::channel_performance(&filtered);
    let insights = insights::generate(&channels, &funnel);

    Dashboard {
        filters,
        row_count: filtered.len(),
        kpis: metrics::kpis(&filtered),
        funnel: funnel.to_vec(),
        trend: metrics::trend(&filtered),
        channels,
        insights,
        warnings,
    }
}
