//! Record filtering.
//!
//! Three stages run in fixed order: category, date, operator. A stage whose
//! field the dataset lacks is skipped.

use super::dates::parse_event_date;
use super::schema::ResolvedSchema;
use crate::models::{Dataset, FilterState, Record};
use chrono::NaiveDate;
use tracing::debug;

/// A record that passed every filter stage.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRow<'a> {
    pub record: &'a Record,
    /// Operator name, `None` when the cell is empty.
    pub operator: Option<String>,
    /// Parsed event date, `None` when the dataset has no date column.
    pub date: Option<NaiveDate>,
}

/// Output of [`FilterEngine::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome<'a> {
    pub rows: Vec<FilteredRow<'a>>,
    pub operator_filter_active: bool,
}

impl FilterOutcome<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Applies a [`FilterState`] to one dataset under its resolved schema.
pub struct FilterEngine<'s> {
    schema: &'s ResolvedSchema,
    day_first: bool,
}

impl<'s> FilterEngine<'s> {
    pub fn new(schema: &'s ResolvedSchema, day_first: bool) -> Self {
        Self { schema, day_first }
    }

    pub fn apply<'d>(&self, dataset: &'d Dataset, filters: &FilterState) -> FilterOutcome<'d> {
        let mut rows: Vec<FilteredRow<'d>> = dataset
            .records
            .iter()
            .map(|record| FilteredRow {
                record,
                operator: record.text(&self.schema.operator),
                date: None,
            })
            .collect();

        if let Some(ref category_field) = self.schema.category {
            rows.retain(|row| {
                row.record
                    .text(category_field)
                    .is_some_and(|label| filters.allows_category(&label))
            });
            debug!("{} rows after category filter", rows.len());
        }

        if let Some(ref date_field) = self.schema.date {
            let before = rows.len();
            rows = rows
                .into_iter()
                .filter_map(|mut row| {
                    let date = row
                        .record
                        .text(date_field)
                        .and_then(|raw| parse_event_date(&raw, self.day_first))?;
                    row.date = Some(date);
                    Some(row)
                })
                .collect();
            let unparsable = before - rows.len();
            if unparsable > 0 {
                debug!("Dropped {} rows with missing or unparsable {}", unparsable, date_field);
            }

            rows.retain(|row| row.date.is_some_and(|d| filters.range.contains(d)));
            debug!("{} rows after date filter", rows.len());
        }

        let operator_filter_active = filters.operators.is_active();
        if operator_filter_active {
            rows.retain(|row| {
                row.operator
                    .as_deref()
                    .is_some_and(|op| filters.operators.allows(op))
            });
            debug!("{} rows after operator filter", rows.len());
        }

        FilterOutcome {
            rows,
            operator_filter_active,
        }
    }
}
