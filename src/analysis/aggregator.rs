//! Productivity aggregation.
//!
//! This module turns a filtered record set into either an overall operator
//! ranking or a per-day comparison between selected operators.

use super::filter::FilteredRow;
use crate::models::{
    AggregationResult, DailyCount, OperatorTotal, RankingResult, RankingRow, TimeSeriesResult,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Aggregate filtered rows.
///
/// Without an operator filter the result is a ranking; with one it is a
/// time series of the selected operators.
pub fn aggregate(rows: &[FilteredRow<'_>], operator_filter_active: bool) -> AggregationResult {
    if operator_filter_active {
        AggregationResult::TimeSeries(compare_operators(rows))
    } else {
        AggregationResult::Ranking(rank_operators(rows))
    }
}

/// Count rows per operator and compute each operator's share.
pub fn rank_operators(rows: &[FilteredRow<'_>]) -> RankingResult {
    let counts = count_by_operator(rows);
    let total: usize = counts.iter().map(|(_, count)| count).sum();

    let rows = counts
        .into_iter()
        .map(|(operator, count)| RankingRow {
            operator,
            count,
            percentage: percentage(count, total),
        })
        .collect();

    RankingResult { rows }
}

/// Count rows per (day, operator), plus per-operator totals.
///
/// Totals come straight from the rows, so they are present even when the
/// dataset has no date column and the series is empty.
pub fn compare_operators(rows: &[FilteredRow<'_>]) -> TimeSeriesResult {
    let mut daily: BTreeMap<(NaiveDate, String), usize> = BTreeMap::new();

    for row in rows {
        if let (Some(day), Some(operator)) = (row.date, row.operator.as_ref()) {
            *daily.entry((day, operator.clone())).or_default() += 1;
        }
    }

    let series = daily
        .into_iter()
        .map(|((day, operator), count)| DailyCount {
            day,
            operator,
            count,
        })
        .collect();

    let summary = count_by_operator(rows)
        .into_iter()
        .map(|(operator, total)| OperatorTotal { operator, total })
        .collect();

    TimeSeriesResult { series, summary }
}

/// Per-operator counts, sorted by count descending then name ascending.
///
/// Rows without an operator are not counted.
fn count_by_operator(rows: &[FilteredRow<'_>]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        if let Some(ref operator) = row.operator {
            *counts.entry(operator.as_str()).or_default() += 1;
        }
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(operator, count)| (operator.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    counts
}

/// Share of `total`, in percent, rounded to 2 decimals.
fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(count as f64 / total as f64 * 100.0)
}

/// Half-to-even at the second decimal, so 3.125 becomes 3.12.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// The `n` operators with the most records.
pub fn top_operators(ranking: &RankingResult, n: usize) -> Vec<&RankingRow> {
    ranking.rows.iter().take(n).collect()
}

/// Number of distinct days covered by a time series.
pub fn active_days(series: &TimeSeriesResult) -> usize {
    let mut days: Vec<NaiveDate> = series.series.iter().map(|p| p.day).collect();
    days.dedup();
    days.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row<'a>(record: &'a Record, operator: &str, day: Option<NaiveDate>) -> FilteredRow<'a> {
        FilteredRow {
            record,
            operator: Some(operator.to_string()),
            date: day,
        }
    }

    #[test]
    fn test_ranking_scenario() {
        let record = Record::new();
        let rows = vec![
            row(&record, "Ana", None),
            row(&record, "Ana", None),
            row(&record, "Beto", None),
        ];

        let ranking = rank_operators(&rows);

        assert_eq!(ranking.rows.len(), 2);
        assert_eq!(ranking.rows[0].operator, "Ana");
        assert_eq!(ranking.rows[0].count, 2);
        assert_eq!(ranking.rows[0].percentage, 66.67);
        assert_eq!(ranking.rows[1].operator, "Beto");
        assert_eq!(ranking.rows[1].count, 1);
        assert_eq!(ranking.rows[1].percentage, 33.33);
        assert_eq!(ranking.total(), 3);
    }

    #[test]
    fn test_percentage_rounds_half_to_even() {
        assert_eq!(percentage(1, 32), 3.12);
        assert_eq!(percentage(3, 32), 9.38);
        assert_eq!(percentage(2, 3), 66.67);
    }

    #[test]
    fn test_ranking_ties_by_name() {
        let record = Record::new();
        let rows = vec![
            row(&record, "Carla", None),
            row(&record, "Beto", None),
            row(&record, "Ana", None),
            row(&record, "Beto", None),
        ];

        let ranking = rank_operators(&rows);
        let names: Vec<_> = ranking.rows.iter().map(|r| r.operator.as_str()).collect();
        assert_eq!(names, vec!["Beto", "Ana", "Carla"]);
    }

    #[test]
    fn test_ranking_percentages_sum_to_100() {
        let record = Record::new();
        let names = ["A", "B", "C", "D", "E", "F", "G"];
        let mut rows = Vec::new();
        for (i, name) in names.iter().enumerate() {
            for _ in 0..=(i * 3 % 5) {
                rows.push(row(&record, name, None));
            }
        }

        let ranking = rank_operators(&rows);
        let sum: f64 = ranking.rows.iter().map(|r| r.percentage).sum();
        let tolerance = 0.01 * ranking.rows.len() as f64;
        assert!((sum - 100.0).abs() <= tolerance, "sum was {}", sum);
    }

    #[test]
    fn test_ranking_skips_missing_operator() {
        let record = Record::new();
        let rows = vec![
            row(&record, "Ana", None),
            FilteredRow {
                record: &record,
                operator: None,
                date: None,
            },
        ];

        let ranking = rank_operators(&rows);
        assert_eq!(ranking.rows.len(), 1);
        assert_eq!(ranking.rows[0].percentage, 100.0);
    }

    #[test]
    fn test_comparison_series_and_summary() {
        let record = Record::new();
        let rows = vec![
            row(&record, "Beto", Some(date(2024, 1, 2))),
            row(&record, "Ana", Some(date(2024, 1, 2))),
            row(&record, "Ana", Some(date(2024, 1, 1))),
            row(&record, "Ana", Some(date(2024, 1, 2))),
        ];

        let result = compare_operators(&rows);

        assert_eq!(
            result.series,
            vec![
                DailyCount {
                    day: date(2024, 1, 1),
                    operator: "Ana".to_string(),
                    count: 1
                },
                DailyCount {
                    day: date(2024, 1, 2),
                    operator: "Ana".to_string(),
                    count: 2
                },
                DailyCount {
                    day: date(2024, 1, 2),
                    operator: "Beto".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(
            result.summary,
            vec![
                OperatorTotal {
                    operator: "Ana".to_string(),
                    total: 3
                },
                OperatorTotal {
                    operator: "Beto".to_string(),
                    total: 1
                },
            ]
        );
        assert_eq!(active_days(&result), 2);
    }

    #[test]
    fn test_comparison_without_dates() {
        let record = Record::new();
        let rows = vec![row(&record, "Ana", None), row(&record, "Ana", None)];

        let result = compare_operators(&rows);
        assert!(result.series.is_empty());
        assert_eq!(result.summary.len(), 1);
        assert_eq!(result.summary[0].total, 2);
    }

    #[test]
    fn test_aggregate_branches_on_flag() {
        let record = Record::new();
        let rows = vec![row(&record, "Ana", Some(date(2024, 1, 1)))];

        assert!(matches!(aggregate(&rows, false), AggregationResult::Ranking(_)));
        assert!(matches!(aggregate(&rows, true), AggregationResult::TimeSeries(_)));
    }

    #[test]
    fn test_top_operators() {
        let record = Record::new();
        let rows = vec![
            row(&record, "Ana", None),
            row(&record, "Ana", None),
            row(&record, "Beto", None),
            row(&record, "Carla", None),
        ];

        let ranking = rank_operators(&rows);
        let top = top_operators(&ranking, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].operator, "Ana");
        assert_eq!(top[1].operator, "Beto");
    }
}
