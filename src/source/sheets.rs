//! Google Sheets CSV export client.

use super::tabular::read_dataset;
use super::DataSource;
use crate::config::SourceConfig;
use crate::error::PipelineError;
use crate::models::Dataset;
use anyhow::{Context, Result};
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

/// Fetches whole sheets as CSV over HTTP.
pub struct SheetSource {
    http_client: reqwest::Client,
    spreadsheet_id: String,
    url_template: String,
    timeout_seconds: u64,
}

impl SheetSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            spreadsheet_id: config.spreadsheet_id.clone(),
            url_template: config.url_template.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Export URL for a sheet.
    pub fn sheet_url(&self, sheet: &str) -> Result<Url, PipelineError> {
        let raw = self
            .url_template
            .replace("{id}", &self.spreadsheet_id)
            .replace("{sheet}", sheet);

        Url::parse(&raw).map_err(|e| PipelineError::SourceUnavailable {
            source_name: sheet.to_string(),
            reason: format!("invalid export URL {}: {}", raw, e),
        })
    }
}

impl DataSource for SheetSource {
    async fn fetch(&self, name: &str) -> Result<Dataset, PipelineError> {
        let url = self.sheet_url(name)?;
        debug!("Fetching {} from {}", name, url);

        let unavailable = |reason: String| PipelineError::SourceUnavailable {
            source_name: name.to_string(),
            reason,
        };

        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                unavailable(format!("request timed out after {}s", self.timeout_seconds))
            } else if e.is_connect() {
                unavailable("cannot connect to the spreadsheet host".to_string())
            } else {
                unavailable(format!("failed to send request: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| unavailable(format!("failed to read response body: {}", e)))?;

        if looks_like_html(&body) {
            return Err(unavailable(
                "received an HTML page instead of CSV (is the sheet shared?)".to_string(),
            ));
        }

        let dataset = read_dataset(&body[..])
            .map_err(|e| unavailable(format!("malformed CSV: {}", e)))?;

        info!("Fetched {} rows from {}", dataset.len(), name);
        Ok(dataset)
    }
}

fn looks_like_html(body: &[u8]) -> bool {
    let head: Vec<u8> = body
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take(15)
        .map(|b| b.to_ascii_lowercase())
        .collect();
    head.starts_with(b"<!doctype") || head.starts_with(b"<html")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str) -> SheetSource {
        let config = SourceConfig {
            spreadsheet_id: id.to_string(),
            ..SourceConfig::default()
        };
        SheetSource::new(&config).unwrap()
    }

    #[test]
    fn test_sheet_url() {
        let url = source("abc123").sheet_url("RIPS").unwrap();
        assert_eq!(url.host_str(), Some("docs.google.com"));
        assert!(url.path().contains("/d/abc123/"));
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "sheet" && v == "RIPS"));
    }

    #[test]
    fn test_sheet_url_encodes_spaces() {
        let url = source("abc123").sheet_url("Hoja 1").unwrap();
        assert!(!url.as_str().contains(' '));
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "sheet" && v == "Hoja 1"));
    }

    #[test]
    fn test_invalid_template() {
        let config = SourceConfig {
            url_template: "not a url {sheet}".to_string(),
            ..SourceConfig::default()
        };
        let source = SheetSource::new(&config).unwrap();
        assert!(matches!(
            source.sheet_url("PPL"),
            Err(PipelineError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_html_detection() {
        assert!(looks_like_html(b"  <!DOCTYPE html><html>"));
        assert!(looks_like_html(b"<HTML><body>"));
        assert!(!looks_like_html(b"USUARIO,FECHA\nAna,2024-01-01\n"));
    }
}
