//! Data models for the productivity reporter.
//!
//! This module contains the core data structures shared by the source
//! layer, the analysis pipeline and the report generator.

use crate::error::PipelineError;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Sentinel operator name meaning "no operator filter".
pub const ALL_OPERATORS: &str = "all";

/// Spanish spelling of [`ALL_OPERATORS`] used by the spreadsheet owners.
pub const ALL_OPERATORS_ES: &str = "todos";

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl FieldValue {
    /// Infer a value from its textual form.
    ///
    /// Numbers are only inferred when their canonical rendering equals the
    /// input, so `"007"` stays text and every value renders back unchanged.
    pub fn from_text(s: &str) -> Self {
        if s.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            if i.to_string() == s {
                return FieldValue::Integer(i);
            }
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() && f.to_string() == s {
                return FieldValue::Float(f);
            }
        }
        FieldValue::Text(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Null => Ok(()),
        }
    }
}

/// One row of source data: field name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(field, text)` pairs, inferring value types.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from_text(v)))
            .collect();
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    /// Textual value of a field, `None` when missing or null.
    pub fn text(&self, field: &str) -> Option<String> {
        self.fields
            .get(field)
            .filter(|value| !value.is_null())
            .map(|value| value.to_string())
    }
}

/// An ordered collection of records sharing a nominal schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Column names in header order.
    pub columns: Vec<String>,
    /// Rows in source order.
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Append a column name unless already present.
    pub fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }
}

/// The four synchronized spreadsheet sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Ppl,
    Convenios,
    Rips,
    Facturacion,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Ppl,
        SourceKind::Convenios,
        SourceKind::Rips,
        SourceKind::Facturacion,
    ];

    /// Key used for the cache file name.
    pub fn cache_key(&self) -> &'static str {
        match self {
            SourceKind::Ppl => "ppl",
            SourceKind::Convenios => "convenios",
            SourceKind::Rips => "rips",
            SourceKind::Facturacion => "facturacion",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Ppl => write!(f, "PPL"),
            SourceKind::Convenios => write!(f, "Convenios"),
            SourceKind::Rips => write!(f, "RIPS"),
            SourceKind::Facturacion => write!(f, "Facturacion"),
        }
    }
}

/// Legalization sub-types, used as category labels on merged rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LegalizationKind {
    #[serde(rename = "PPL")]
    Ppl,
    #[serde(rename = "Convenios")]
    Convenios,
}

impl LegalizationKind {
    pub const ALL: [LegalizationKind; 2] = [LegalizationKind::Ppl, LegalizationKind::Convenios];

    /// Category value stamped on merged rows.
    pub fn label(&self) -> &'static str {
        match self {
            LegalizationKind::Ppl => "PPL",
            LegalizationKind::Convenios => "Convenios",
        }
    }

    /// The source holding this kind of legalization.
    pub fn source(&self) -> SourceKind {
        match self {
            LegalizationKind::Ppl => SourceKind::Ppl,
            LegalizationKind::Convenios => SourceKind::Convenios,
        }
    }
}

/// The three report views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportView {
    Legalizaciones,
    Rips,
    Facturacion,
}

impl ReportView {
    pub const ALL: [ReportView; 3] = [
        ReportView::Legalizaciones,
        ReportView::Rips,
        ReportView::Facturacion,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ReportView::Legalizaciones => "Legalizaciones",
            ReportView::Rips => "RIPS",
            ReportView::Facturacion => "Facturación",
        }
    }
}

/// Closed date interval `[start, end]`, with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PipelineError> {
        if start > end {
            return Err(PipelineError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days`-long window ending on `today`.
    pub fn lookback(today: NaiveDate, days: u32) -> Result<Self, PipelineError> {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or(PipelineError::LookbackOutOfRange { days })?;
        Ok(Self { start, end: today })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive at both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Operator selection: everybody, or an explicit subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorSelection {
    All,
    Only(BTreeSet<String>),
}

impl OperatorSelection {
    /// Build a selection from user input.
    ///
    /// An empty list, or one containing the sentinel, selects everybody.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected = BTreeSet::new();
        for name in names {
            let name = name.as_ref().trim();
            if is_all_sentinel(name) {
                return OperatorSelection::All;
            }
            if !name.is_empty() {
                selected.insert(name.to_string());
            }
        }

        if selected.is_empty() {
            OperatorSelection::All
        } else {
            OperatorSelection::Only(selected)
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, OperatorSelection::Only(_))
    }

    pub fn allows(&self, operator: &str) -> bool {
        match self {
            OperatorSelection::All => true,
            OperatorSelection::Only(names) => names.contains(operator),
        }
    }
}

fn is_all_sentinel(name: &str) -> bool {
    name.eq_ignore_ascii_case(ALL_OPERATORS) || name.eq_ignore_ascii_case(ALL_OPERATORS_ES)
}

/// Immutable snapshot of the user's filter selections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterState {
    pub categories: BTreeSet<LegalizationKind>,
    pub operators: OperatorSelection,
    pub range: DateRange,
}

impl FilterState {
    pub fn new(
        categories: BTreeSet<LegalizationKind>,
        operators: OperatorSelection,
        range: DateRange,
    ) -> Self {
        Self {
            categories,
            operators,
            range,
        }
    }

    /// Whether a category label is among the selected legalization kinds.
    pub fn allows_category(&self, label: &str) -> bool {
        self.categories.iter().any(|k| k.label() == label)
    }
}

/// One operator's share of the filtered records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub operator: String,
    pub count: usize,
    /// Percentage of the ranked total, rounded to 2 decimals.
    pub percentage: f64,
}

/// Overall ranking, sorted by count descending then operator ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankingResult {
    pub rows: Vec<RankingRow>,
}

impl RankingResult {
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }
}

/// Records handled by one operator on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub operator: String,
    pub count: usize,
}

/// Total records handled by one operator across the whole window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorTotal {
    pub operator: String,
    pub total: usize,
}

/// Per-day, per-operator comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeriesResult {
    /// Ordered by day, then operator.
    pub series: Vec<DailyCount>,
    /// Ordered by total descending, then operator.
    pub summary: Vec<OperatorTotal>,
}

/// Aggregated output; the variant depends on whether an operator filter is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AggregationResult {
    Ranking(RankingResult),
    TimeSeries(TimeSeriesResult),
}

/// Why a view has nothing to show before any filter ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataReason {
    /// No source for the view has ever been synchronized.
    NotSynchronized,
    /// Sources are loaded but hold no rows.
    NoRows,
}

/// A reportable view: record count plus the aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewReport {
    pub total_records: usize,
    pub result: AggregationResult,
}

/// Outcome of computing one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewOutcome {
    NoData { reason: NoDataReason },
    CannotProcess { reason: String },
    EmptyAfterFilter,
    Ready(ViewReport),
}

/// A view together with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSection {
    pub view: ReportView,
    pub title: String,
    pub outcome: ViewOutcome,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub filters: FilterState,
    /// Whether this run fetched fresh data from the source.
    pub synchronized: bool,
    /// Sources present in the snapshot.
    pub loaded_sources: Vec<SourceKind>,
    pub duration_seconds: f64,
}

/// The complete productivity report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub sections: Vec<ViewSection>,
    /// Every operator seen across loaded sources.
    pub known_operators: Vec<String>,
}
