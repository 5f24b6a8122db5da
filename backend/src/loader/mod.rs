//! Dataset loading collaborator.
//!
//! Owns the one external fetch of the pipeline and its cache lifetime:
//! `load` fetches, parses, normalizes and derives ratios at most once per
//! loader; every later call reuses the cached dataset until `refresh`
//! invalidates it. The render pass itself never re-fetches - cache
//! invalidation is the caller's decision, made explicit here instead of
//! hiding behind process-global memoization.
//!
//! The loader hands out `Arc<Dataset>` snapshots; downstream stages treat
//! them as read-only.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::definition::ReportDefinition;
use crate::error::{LoadError, LoadResult};
use crate::models::Dataset;
use crate::parser::parse_bytes_auto;
use crate::report::normalize::normalize;
use crate::report::ratio::derive_ratios;

// =============================================================================
// Source
// =============================================================================

/// Where the source table comes from.
#[derive(Debug, Clone)]
pub enum ReportSource {
    /// Remote export fetched over HTTP(S).
    Url(String),
    /// Local file (mostly for the CLI and tests).
    File(PathBuf),
}

impl ReportSource {
    /// Interpret a CLI/env string: anything with an http(s) scheme is a
    /// URL, everything else a file path.
    pub fn parse(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            ReportSource::Url(input.to_string())
        } else {
            ReportSource::File(PathBuf::from(input))
        }
    }

    /// Human-readable description for logs and metadata.
    pub fn describe(&self) -> String {
        match self {
            ReportSource::Url(url) => url.clone(),
            ReportSource::File(path) => path.display().to_string(),
        }
    }
}

// =============================================================================
// Load metadata
// =============================================================================

/// Metadata about the cached load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadInfo {
    /// Source description (URL or path).
    pub source: String,
    /// Detected encoding of the fetched bytes.
    pub encoding: String,
    /// Detected delimiter.
    pub delimiter: char,
    /// Data rows in the raw table.
    pub raw_rows: usize,
    /// Rows dropped by the admission rule.
    pub dropped_rows: usize,
    /// Records in the normalized dataset.
    pub dataset_rows: usize,
    /// When the source was fetched.
    pub fetched_at: DateTime<Utc>,
}

struct CachedLoad {
    dataset: Arc<Dataset>,
    info: LoadInfo,
}

// =============================================================================
// Loader
// =============================================================================

/// Fetches and caches one dataset for its own lifetime.
pub struct DatasetLoader {
    source: ReportSource,
    definition: ReportDefinition,
    cached: RwLock<Option<CachedLoad>>,
}

impl DatasetLoader {
    pub fn new(source: ReportSource, definition: ReportDefinition) -> Self {
        Self {
            source,
            definition,
            cached: RwLock::new(None),
        }
    }

    pub fn definition(&self) -> &ReportDefinition {
        &self.definition
    }

    /// The cached dataset, fetching it on first use.
    pub async fn load(&self) -> LoadResult<(Arc<Dataset>, LoadInfo)> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            return Ok((cached.dataset.clone(), cached.info.clone()));
        }

        let mut guard = self.cached.write().await;
        // Another task may have loaded while we waited for the lock.
        if let Some(cached) = guard.as_ref() {
            return Ok((cached.dataset.clone(), cached.info.clone()));
        }

        let cached = self.load_uncached().await?;
        let result = (cached.dataset.clone(), cached.info.clone());
        *guard = Some(cached);
        Ok(result)
    }

    /// Drop the cache and fetch the source again.
    pub async fn refresh(&self) -> LoadResult<(Arc<Dataset>, LoadInfo)> {
        let mut guard = self.cached.write().await;
        let cached = self.load_uncached().await?;
        let result = (cached.dataset.clone(), cached.info.clone());
        *guard = Some(cached);
        Ok(result)
    }

    /// Metadata of the current cache, if loaded.
    pub async fn info(&self) -> Option<LoadInfo> {
        self.cached.read().await.as_ref().map(|c| c.info.clone())
    }

    async fn load_uncached(&self) -> LoadResult<CachedLoad> {
        log_info(format!("Reading source: {}", self.source.describe()));
        let bytes = self.fetch_bytes().await?;
        log_success(format!("Fetched {} bytes", bytes.len()));

        let table = parse_bytes_auto(&bytes)?;
        log_success(format!("Detected encoding: {}", table.encoding));
        log_success(format!("Detected delimiter: '{}'", table.delimiter));
        log_success(format!("Read {} rows", table.rows.len()));

        let normalized = normalize(&table, &self.definition)?;
        if normalized.dropped > 0 {
            log_warning(format!(
                "{} rows dropped (no non-zero numeric value)",
                normalized.dropped
            ));
        }
        let dataset = derive_ratios(normalized.dataset, &self.definition);
        log_success(format!("Dataset ready: {} records", dataset.len()));

        let info = LoadInfo {
            source: self.source.describe(),
            encoding: table.encoding.clone(),
            delimiter: table.delimiter,
            raw_rows: table.rows.len(),
            dropped_rows: normalized.dropped,
            dataset_rows: dataset.len(),
            fetched_at: Utc::now(),
        };

        Ok(CachedLoad {
            dataset: Arc::new(dataset),
            info,
        })
    }

    async fn fetch_bytes(&self) -> LoadResult<Vec<u8>> {
        match &self.source {
            ReportSource::Url(url) => {
                let response = reqwest::get(url)
                    .await
                    .map_err(|e| LoadError::FetchError(e.to_string()))?
                    .error_for_status()
                    .map_err(|e| LoadError::FetchError(e.to_string()))?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| LoadError::FetchError(e.to_string()))?;
                Ok(bytes.to_vec())
            }
            ReportSource::File(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
