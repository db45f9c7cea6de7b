#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geography API client and hierarchy cache.
//!
//! Provides the [`GeographyApi`] trait for fetching District/Block/GP
//! lists from the backend, the reqwest-backed [`HttpGeographyApi`]
//! implementation ([`client`]), and [`GeoCache`] ([`cache`]): the
//! per-parent list cache with coalescing in-flight fetches that every
//! dashboard screen shares.

pub mod cache;
pub mod client;

use swachh_monitor_geography_models::{GeoId, GeographyNode};
use thiserror::Error;

pub use cache::{FetchKey, GeoCache};
pub use client::HttpGeographyApi;

/// Errors that can occur while fetching geography lists.
#[derive(Debug, Error)]
pub enum GeoError {
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

/// Trait for fetching administrative hierarchy lists from the backend.
///
/// A legitimately empty level returns an empty list, not an error;
/// errors mean the transport or decoding failed.
pub trait GeographyApi: Send + Sync {
    /// Fetches all districts.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the HTTP request or response decoding
    /// fails.
    fn districts(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<GeographyNode>, GeoError>> + Send;

    /// Fetches the blocks of one district.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the HTTP request or response decoding
    /// fails.
    fn blocks(
        &self,
        district_id: GeoId,
    ) -> impl std::future::Future<Output = Result<Vec<GeographyNode>, GeoError>> + Send;

    /// Fetches the Gram Panchayats of one block.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the HTTP request or response decoding
    /// fails.
    fn gps(
        &self,
        district_id: GeoId,
        block_id: GeoId,
    ) -> impl std::future::Future<Output = Result<Vec<GeographyNode>, GeoError>> + Send;
}
