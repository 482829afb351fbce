//! Column name resolution.
//!
//! Sources spell the same semantic field differently (`USUARIO` vs
//! `Usuario`, `FECHA_REAL` vs `FECHA`). The resolver maps a dataset's
//! header onto canonical fields once, so the filter and the aggregator never
//! probe column names themselves.

use crate::config::SchemaConfig;
use crate::error::PipelineError;
use crate::models::Dataset;

/// Canonical field mapping for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    /// Column holding the operator name.
    pub operator: String,
    /// Column holding the event date; date filtering is a no-op without it.
    pub date: Option<String>,
    /// Column holding the category label; category filtering is a no-op without it.
    pub category: Option<String>,
}

/// Resolves canonical fields from priority-ordered alias lists.
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    operator_aliases: Vec<String>,
    date_aliases: Vec<String>,
    category_field: String,
}

impl SchemaResolver {
    pub fn new(config: &SchemaConfig) -> Self {
        Self {
            operator_aliases: config.operator_aliases.clone(),
            date_aliases: config.date_aliases.clone(),
            category_field: config.category_field.clone(),
        }
    }

    /// Resolve the canonical fields of a dataset from its header.
    ///
    /// The category field is only looked up when `with_category` is set;
    /// single-source datasets may carry an unrelated column of that name.
    pub fn resolve(
        &self,
        dataset: &Dataset,
        with_category: bool,
    ) -> Result<ResolvedSchema, PipelineError> {
        self.resolve_fields(&dataset.columns, with_category)
    }

    /// Resolve canonical fields from a set of field names.
    ///
    /// Matching is exact and case-sensitive; the first alias present wins.
    pub fn resolve_fields(
        &self,
        fields: &[String],
        with_category: bool,
    ) -> Result<ResolvedSchema, PipelineError> {
        let has = |name: &str| fields.iter().any(|f| f == name);

        let operator = first_present(&self.operator_aliases, has).ok_or_else(|| {
            PipelineError::SchemaIncomplete {
                tried: self.operator_aliases.clone(),
            }
        })?;

        Ok(ResolvedSchema {
            operator,
            date: first_present(&self.date_aliases, has),
            category: (with_category && has(&self.category_field))
                .then(|| self.category_field.clone()),
        })
    }

    /// Resolve only the operator column, if any.
    pub fn operator_field(&self, dataset: &Dataset) -> Option<String> {
        first_present(&self.operator_aliases, |name| dataset.has_column(name))
    }
}

fn first_present(candidates: &[String], has: impl Fn(&str) -> bool) -> Option<String> {
    candidates.iter().find(|c| has(c)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn resolver() -> SchemaResolver {
        SchemaResolver::new(&SchemaConfig::default())
    }

    #[test]
    fn test_operator_priority() {
        let schema = resolver()
            .resolve_fields(&columns(&["Usuario", "USUARIO", "FECHA"]), true)
            .unwrap();
        assert_eq!(schema.operator, "USUARIO");

        let schema = resolver()
            .resolve_fields(&columns(&["Facturador", "FECHA"]), true)
            .unwrap();
        assert_eq!(schema.operator, "Facturador");
    }

    #[test]
    fn test_date_priority() {
        let schema = resolver()
            .resolve_fields(&columns(&["USUARIO", "Fecha", "FECHA_FACTURA"]), true)
            .unwrap();
        assert_eq!(schema.date.as_deref(), Some("FECHA_FACTURA"));

        let schema = resolver()
            .resolve_fields(&columns(&["USUARIO", "FECHA", "FECHA_REAL"]), true)
            .unwrap();
        assert_eq!(schema.date.as_deref(), Some("FECHA_REAL"));
    }

    #[test]
    fn test_missing_date_is_not_an_error() {
        let schema = resolver()
            .resolve_fields(&columns(&["USUARIO", "VALOR"]), true)
            .unwrap();
        assert_eq!(schema.date, None);
        assert_eq!(schema.category, None);
    }

    #[test]
    fn test_category_field() {
        let schema = resolver()
            .resolve_fields(&columns(&["USUARIO", "Tipo_Leg"]), true)
            .unwrap();
        assert_eq!(schema.category.as_deref(), Some("Tipo_Leg"));
    }

    #[test]
    fn test_category_field_ignored_when_not_requested() {
        let schema = resolver()
            .resolve_fields(&columns(&["USUARIO", "Tipo_Leg"]), false)
            .unwrap();
        assert_eq!(schema.category, None);
    }

    #[test]
    fn test_case_sensitive_match() {
        let err = resolver()
            .resolve_fields(&columns(&["usuario", "fecha"]), true)
            .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaIncomplete { .. }));
    }
}
