//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.prodreport.toml` files.

use crate::models::{LegalizationKind, SourceKind};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".prodreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Remote spreadsheet settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Local snapshot cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Column name resolution.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Default filter selections.
    #[serde(default)]
    pub filters: FiltersConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Length of the default date window, ending today.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            lookback_days: default_lookback_days(),
        }
    }
}

fn default_output() -> String {
    "productivity_report.md".to_string()
}

fn default_lookback_days() -> u32 {
    30
}

/// Remote spreadsheet settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Spreadsheet document id.
    #[serde(default)]
    pub spreadsheet_id: String,

    /// CSV export URL; `{id}` and `{sheet}` are substituted.
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Sheet holding PPL legalizations.
    #[serde(default = "default_ppl_sheet")]
    pub ppl_sheet: String,

    /// Sheet holding Convenio legalizations.
    #[serde(default = "default_convenios_sheet")]
    pub convenios_sheet: String,

    /// Sheet holding RIPS records.
    #[serde(default = "default_rips_sheet")]
    pub rips_sheet: String,

    /// Sheet holding billing entries.
    #[serde(default = "default_facturacion_sheet")]
    pub facturacion_sheet: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            url_template: default_url_template(),
            timeout_seconds: default_timeout(),
            ppl_sheet: default_ppl_sheet(),
            convenios_sheet: default_convenios_sheet(),
            rips_sheet: default_rips_sheet(),
            facturacion_sheet: default_facturacion_sheet(),
        }
    }
}

impl SourceConfig {
    /// Sheet name for a source.
    pub fn sheet_name(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Ppl => &self.ppl_sheet,
            SourceKind::Convenios => &self.convenios_sheet,
            SourceKind::Rips => &self.rips_sheet,
            SourceKind::Facturacion => &self.facturacion_sheet,
        }
    }
}

fn default_url_template() -> String {
    "https://docs.google.com/spreadsheets/d/{id}/gviz/tq?tqx=out:csv&sheet={sheet}".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_ppl_sheet() -> String {
    "PPL".to_string()
}

fn default_convenios_sheet() -> String {
    "Convenios".to_string()
}

fn default_rips_sheet() -> String {
    "RIPS".to_string()
}

fn default_facturacion_sheet() -> String {
    "Facturacion".to_string()
}

/// Snapshot cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding one CSV snapshot per source.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// Read and write the cache at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            enabled: true,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("persisted_data")
}

fn default_true() -> bool {
    true
}

/// Column name resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Operator column candidates, highest priority first.
    #[serde(default = "default_operator_aliases")]
    pub operator_aliases: Vec<String>,

    /// Event date column candidates, highest priority first.
    #[serde(default = "default_date_aliases")]
    pub date_aliases: Vec<String>,

    /// Column stamped with the legalization kind when merging.
    #[serde(default = "default_category_field")]
    pub category_field: String,

    /// Read `01/02/2024` as 1 February rather than 2 January.
    #[serde(default = "default_true")]
    pub day_first: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            operator_aliases: default_operator_aliases(),
            date_aliases: default_date_aliases(),
            category_field: default_category_field(),
            day_first: true,
        }
    }
}

fn default_operator_aliases() -> Vec<String> {
    vec!["USUARIO", "Usuario", "FACTURADOR", "Facturador"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_date_aliases() -> Vec<String> {
    vec!["FECHA_REAL", "FECHA_FACTURA", "FECHA", "Fecha"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_category_field() -> String {
    "Tipo_Leg".to_string()
}

/// Default filter selections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Legalization kinds selected when `--category` is not given.
    #[serde(default = "default_categories")]
    pub categories: Vec<LegalizationKind>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
        }
    }
}

fn default_categories() -> Vec<LegalizationKind> {
    LegalizationKind::ALL.to_vec()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings and only
    /// override when given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(days) = args.lookback_days {
            self.general.lookback_days = days;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref id) = args.spreadsheet_id {
            self.source.spreadsheet_id = id.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }

        if let Some(ref dir) = args.cache_dir {
            self.cache.dir = dir.clone();
        }
        if args.no_cache {
            self.cache.enabled = false;
        }

        if let Some(ref categories) = args.category {
            self.filters.categories = categories.iter().map(|c| c.kind()).collect();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.lookback_days, 30);
        assert_eq!(config.cache.dir, PathBuf::from("persisted_data"));
        assert_eq!(config.schema.operator_aliases[0], "USUARIO");
        assert_eq!(config.schema.date_aliases[0], "FECHA_REAL");
        assert_eq!(config.schema.category_field, "Tipo_Leg");
        assert_eq!(config.filters.categories.len(), 2);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"
lookback_days = 7

[source]
spreadsheet_id = "abc123"
rips_sheet = "RIPS_2024"

[schema]
operator_aliases = ["Operador"]
day_first = false

[filters]
categories = ["PPL"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert_eq!(config.general.lookback_days, 7);
        assert_eq!(config.source.spreadsheet_id, "abc123");
        assert_eq!(config.source.sheet_name(SourceKind::Rips), "RIPS_2024");
        assert_eq!(config.source.sheet_name(SourceKind::Ppl), "PPL");
        assert_eq!(config.schema.operator_aliases, vec!["Operador"]);
        assert_eq!(config.schema.date_aliases[0], "FECHA_REAL");
        assert!(!config.schema.day_first);
        assert_eq!(config.filters.categories, vec![LegalizationKind::Ppl]);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[cache]"));
        assert!(toml_str.contains("[schema]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.schema.category_field, "Tipo_Leg");
    }
}
