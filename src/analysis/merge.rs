//! Merging category-labeled datasets.

use crate::models::{Dataset, FieldValue};

/// Concatenate labeled datasets, stamping each row with its source label.
///
/// Rows keep source order and sources keep the order given. The merged
/// header is the union of the source headers in first-seen order, followed
/// by `category_field`. Returns `None` when there is nothing to merge, which
/// callers report as "not synchronized" rather than as an empty merge.
pub fn merge_labeled(sources: &[(&str, &Dataset)], category_field: &str) -> Option<Dataset> {
    if sources.is_empty() {
        return None;
    }

    let mut merged = Dataset::default();
    for (_, dataset) in sources {
        for column in &dataset.columns {
            merged.add_column(column);
        }
    }
    merged.add_column(category_field);

    let total_rows = sources.iter().map(|(_, d)| d.len()).sum();
    merged.records.reserve(total_rows);

    for (label, dataset) in sources {
        for record in &dataset.records {
            let mut tagged = record.clone();
            tagged.insert(category_field, FieldValue::Text(label.to_string()));
            merged.push(tagged);
        }
    }

    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    fn dataset(columns: &[&str], operators: &[&str]) -> Dataset {
        let mut ds = Dataset::new(columns.iter().map(|c| c.to_string()).collect());
        for op in operators {
            ds.push(Record::from_pairs([("USUARIO", *op)]));
        }
        ds
    }

    #[test]
    fn test_merge_sizes_and_labels() {
        let ppl = dataset(&["USUARIO"], &["Ana", "Ana", "Beto"]);
        let convenios = dataset(&["USUARIO"], &["Carla", "Dario"]);

        let merged = merge_labeled(&[("PPL", &ppl), ("Convenios", &convenios)], "Tipo_Leg").unwrap();

        assert_eq!(merged.len(), 5);
        let labels: Vec<_> = merged
            .records
            .iter()
            .map(|r| r.text("Tipo_Leg").unwrap())
            .collect();
        assert_eq!(labels, vec!["PPL", "PPL", "PPL", "Convenios", "Convenios"]);

        let operators: Vec<_> = merged
            .records
            .iter()
            .map(|r| r.text("USUARIO").unwrap())
            .collect();
        assert_eq!(operators, vec!["Ana", "Ana", "Beto", "Carla", "Dario"]);
    }

    #[test]
    fn test_merge_header_union() {
        let a = dataset(&["USUARIO", "FECHA"], &[]);
        let b = dataset(&["Usuario", "FECHA", "VALOR"], &[]);

        let merged = merge_labeled(&[("PPL", &a), ("Convenios", &b)], "Tipo_Leg").unwrap();
        assert_eq!(
            merged.columns,
            vec!["USUARIO", "FECHA", "Usuario", "VALOR", "Tipo_Leg"]
        );
    }

    #[test]
    fn test_merge_nothing_vs_empty_sources() {
        assert!(merge_labeled(&[], "Tipo_Leg").is_none());

        let empty = dataset(&["USUARIO"], &[]);
        let merged = merge_labeled(&[("PPL", &empty), ("Convenios", &empty)], "Tipo_Leg").unwrap();
        assert!(merged.is_empty());
        assert!(merged.has_column("Tipo_Leg"));
    }
}
