//! Reqwest-backed implementation of [`GeographyApi`].
//!
//! Districts come back as a single JSON array. Block and GP lists are
//! paginated with `skip`/`limit` query parameters and fetched to
//! exhaustion; a page shorter than the page size terminates the loop.

use serde::Deserialize;
use swachh_monitor_geography_models::{GeoId, GeographyNode};

use crate::{GeoError, GeographyApi};

/// Page size for paginated geography requests.
const GEO_PAGE_SIZE: u32 = 100;

/// HTTP client for the Geography API.
#[derive(Debug, Clone)]
pub struct HttpGeographyApi {
    client: reqwest::Client,
    base_url: String,
}

/// A district row as returned by `GET /geography/districts`.
#[derive(Debug, Deserialize)]
struct RawDistrict {
    id: GeoId,
    name: Option<String>,
}

/// A block row as returned by `GET /geography/blocks`.
#[derive(Debug, Deserialize)]
struct RawBlock {
    id: GeoId,
    name: Option<String>,
    district_id: Option<GeoId>,
}

/// A GP row as returned by `GET /geography/grampanchayats`.
#[derive(Debug, Deserialize)]
struct RawGp {
    id: GeoId,
    name: Option<String>,
    block_id: Option<GeoId>,
}

impl HttpGeographyApi {
    /// Creates a client for the given base URL. When a bearer token is
    /// provided it is attached to every request as a default
    /// `Authorization` header; 401 handling stays outside this crate.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the underlying client cannot be built or
    /// the token is not a valid header value.
    pub fn new(base_url: &str, bearer_token: Option<&str>) -> Result<Self, GeoError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = bearer_token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| GeoError::Conversion {
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

    /// Fetches one page of a paginated list endpoint.
    async fn fetch_page<T: serde::de::DeserializeOwned>(
        &self,
        path_and_query: &str,
        skip: u32,
    ) -> Result<Vec<T>, GeoError> {
        let sep = if path_and_query.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{path_and_query}{sep}skip={skip}&limit={GEO_PAGE_SIZE}",
            self.base_url
        );

        log::debug!("Fetching geography page: {url}");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetches every page of a paginated list endpoint.
    async fn fetch_all<T: serde::de::DeserializeOwned>(
        &self,
        path_and_query: &str,
    ) -> Result<Vec<T>, GeoError> {
        let mut all = Vec::new();
        let mut skip = 0u32;

        loop {
            let page: Vec<T> = self.fetch_page(path_and_query, skip).await?;
            let page_len = page.len();
            all.extend(page);

            if page_len < GEO_PAGE_SIZE as usize {
                break;
            }
            skip += GEO_PAGE_SIZE;
        }

        Ok(all)
    }
}

impl GeographyApi for HttpGeographyApi {
    async fn districts(&self) -> Result<Vec<GeographyNode>, GeoError> {
        let url = format!("{}/geography/districts", self.base_url);
        log::debug!("Fetching districts: {url}");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let rows: Vec<RawDistrict> = response.json().await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                GeographyNode::district(row.id, row.name.unwrap_or_else(|| "Unknown".to_owned()))
            })
            .collect())
    }

    async fn blocks(&self, district_id: GeoId) -> Result<Vec<GeographyNode>, GeoError> {
        let rows: Vec<RawBlock> = self
            .fetch_all(&format!("/geography/blocks?district_id={district_id}"))
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                GeographyNode::block(
                    row.id,
                    row.name.unwrap_or_else(|| "Unknown".to_owned()),
                    row.district_id.unwrap_or(district_id),
                )
            })
            .collect())
    }

    async fn gps(&self, district_id: GeoId, block_id: GeoId) -> Result<Vec<GeographyNode>, GeoError> {
        let rows: Vec<RawGp> = self
            .fetch_all(&format!(
                "/geography/grampanchayats?district_id={district_id}&block_id={block_id}"
            ))
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                GeographyNode::gp(
                    row.id,
                    row.name.unwrap_or_else(|| "Unknown".to_owned()),
                    row.block_id.unwrap_or(block_id),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_rows_tolerate_missing_fields() {
        let row: RawBlock = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(row.id, 7);
        assert_eq!(row.name, None);
        assert_eq!(row.district_id, None);
    }

    #[test]
    fn trims_trailing_slash() {
        let api = HttpGeographyApi::new("http://localhost:8000/", None).unwrap();
        assert_eq!(api.base_url, "http://localhost:8000");
    }
}
