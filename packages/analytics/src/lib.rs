#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analytics API client and metrics aggregation engine.
//!
//! [`client`] fetches raw analytics rows filtered by geography level,
//! unit ids, and date range; [`aggregate`] folds them into the summary
//! totals, capped percentages, rankings, and per-geography groupings
//! the dashboard cards display.

pub mod aggregate;
pub mod client;

use swachh_monitor_analytics_models::{AnalyticsDomain, AnalyticsRecord};
use thiserror::Error;

pub use client::{AnalyticsQuery, HttpAnalyticsApi};

/// Errors that can occur while fetching analytics rows.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// HTTP request failed (transport error or non-2xx status).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Trait for fetching analytics rows from the backend.
///
/// An empty result set is legitimate (zero rows for the filter), not
/// an error.
pub trait AnalyticsApi: Send + Sync {
    /// Fetches the normalized analytics rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the HTTP request or response
    /// decoding fails.
    fn fetch(
        &self,
        domain: AnalyticsDomain,
        query: &AnalyticsQuery,
    ) -> impl std::future::Future<Output = Result<Vec<AnalyticsRecord>, AnalyticsError>> + Send;
}
