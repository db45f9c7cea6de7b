//! Reqwest-backed implementation of [`AnalyticsApi`].
//!
//! Builds `GET /{domain}/analytics` queries from the current scope and
//! date range, decodes the response envelope, and normalizes every row
//! at this boundary so downstream aggregation never sees optional
//! fields.

use std::fmt::Write as _;

use chrono::NaiveDate;
use swachh_monitor_analytics_models::{
    AnalyticsDomain, AnalyticsEnvelope, AnalyticsLevel, AnalyticsRecord,
};
use swachh_monitor_dates::DateRange;
use swachh_monitor_geography_models::GeoId;

use crate::{AnalyticsApi, AnalyticsError};

/// Default maximum number of rows requested per query.
const DEFAULT_LIMIT: u32 = 100;

/// Filter parameters for one analytics query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsQuery {
    /// Geography granularity of the result rows.
    pub level: AnalyticsLevel,
    /// Restrict to one district.
    pub district_id: Option<GeoId>,
    /// Restrict to one block.
    pub block_id: Option<GeoId>,
    /// Restrict to one GP.
    pub gp_id: Option<GeoId>,
    /// First day, inclusive.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Maximum number of rows to return.
    pub limit: u32,
}

impl AnalyticsQuery {
    /// Creates a query for the given level over the given range, with
    /// no geography filter and the default row limit.
    #[must_use]
    pub fn new(level: AnalyticsLevel, range: &DateRange) -> Self {
        Self {
            level,
            district_id: None,
            block_id: None,
            gp_id: None,
            start_date: range.start,
            end_date: range.end,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Restricts the query to one district.
    #[must_use]
    pub const fn with_district(mut self, district_id: Option<GeoId>) -> Self {
        self.district_id = district_id;
        self
    }

    /// Restricts the query to one block.
    #[must_use]
    pub const fn with_block(mut self, block_id: Option<GeoId>) -> Self {
        self.block_id = block_id;
        self
    }

    /// Restricts the query to one GP.
    #[must_use]
    pub const fn with_gp(mut self, gp_id: Option<GeoId>) -> Self {
        self.gp_id = gp_id;
        self
    }

    /// Sets the maximum number of rows to return.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Renders the query-string portion of the request URL.
    fn query_string(&self) -> String {
        let mut query = format!("level={}", self.level.as_ref());

        let mut append = |key: &str, value: &str| {
            write!(query, "&{key}={value}").unwrap();
        };

        if let Some(id) = self.district_id {
            append("district_id", &id.to_string());
        }
        if let Some(id) = self.block_id {
            append("block_id", &id.to_string());
        }
        if let Some(id) = self.gp_id {
            append("gp_id", &id.to_string());
        }

        append("start_date", &self.start_date.format("%Y-%m-%d").to_string());
        append("end_date", &self.end_date.format("%Y-%m-%d").to_string());
        append("limit", &self.limit.to_string());

        query
    }
}

/// HTTP client for the Analytics API.
#[derive(Debug, Clone)]
pub struct HttpAnalyticsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalyticsApi {
    /// Creates a client for the given base URL. When a bearer token is
    /// provided it is attached to every request as a default
    /// `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the underlying client cannot be
    /// built or the token is not a valid header value.
    pub fn new(base_url: &str, bearer_token: Option<&str>) -> Result<Self, AnalyticsError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = bearer_token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| AnalyticsError::Conversion {
                    message: format!("invalid bearer token: {e}"),
                })?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl AnalyticsApi for HttpAnalyticsApi {
    async fn fetch(
        &self,
        domain: AnalyticsDomain,
        query: &AnalyticsQuery,
    ) -> Result<Vec<AnalyticsRecord>, AnalyticsError> {
        let url = format!(
            "{}/{}/analytics?{}",
            self.base_url,
            domain.as_ref(),
            query.query_string()
        );

        log::debug!("Fetching analytics: {url}");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let envelope: AnalyticsEnvelope = response.json().await?;

        let records: Vec<AnalyticsRecord> = envelope
            .response
            .into_iter()
            .map(AnalyticsRecord::from_raw)
            .collect();

        log::debug!(
            "Analytics {} at {}: {} rows",
            domain.as_ref(),
            query.level.as_ref(),
            records.len()
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use swachh_monitor_dates::PredefinedRange;

    use super::*;

    fn range() -> DateRange {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        PredefinedRange::Last7Days.resolve(today).unwrap()
    }

    #[test]
    fn query_string_includes_only_set_ids() {
        let query = AnalyticsQuery::new(AnalyticsLevel::Block, &range()).with_district(Some(4));

        assert_eq!(
            query.query_string(),
            "level=BLOCK&district_id=4&start_date=2025-01-08&end_date=2025-01-15&limit=100"
        );
    }

    #[test]
    fn query_string_with_full_path() {
        let query = AnalyticsQuery::new(AnalyticsLevel::Village, &range())
            .with_district(Some(4))
            .with_block(Some(17))
            .with_gp(Some(230))
            .with_limit(25);

        assert_eq!(
            query.query_string(),
            "level=VILLAGE&district_id=4&block_id=17&gp_id=230\
             &start_date=2025-01-08&end_date=2025-01-15&limit=25"
        );
    }
}
