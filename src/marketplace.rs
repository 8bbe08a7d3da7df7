//! Marketplace listings client.
//!
//! Fetches one bounded page of Axie listings from the marketplace GraphQL API.
//! The envelope must be intact (`data.axies.results`), but individual items are
//! decoded one at a time: an item that does not decode is counted as rejected
//! and the rest of the page survives.

use crate::config::MarketplaceConfig;
use crate::entities::ListingRecord;
use crate::error::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Page parameters sent upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub sort: String,
    pub offset: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn from_config(config: &MarketplaceConfig) -> Self {
        Self {
            sort: config.sort.clone(),
            offset: config.page_offset,
            size: config.page_size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::from_config(&MarketplaceConfig::default())
    }
}

/// Decoded page plus the number of items that could not be decoded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub records: Vec<ListingRecord>,
    pub rejected: usize,
}

impl ListingPage {
    pub fn from_records(records: Vec<ListingRecord>) -> Self {
        Self { records, rejected: 0 }
    }

    /// Items the upstream returned, decodable or not
    pub fn total(&self) -> usize {
        self.records.len() + self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Anything that can produce a page of listings
pub trait ListingSource: Send + Sync {
    fn fetch_page(&self, page: &PageRequest) -> impl Future<Output = Result<ListingPage>> + Send;
}

pub struct MarketplaceClient {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl MarketplaceClient {
    pub fn new(config: &MarketplaceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }
}

impl ListingSource for MarketplaceClient {
    async fn fetch_page(&self, page: &PageRequest) -> Result<ListingPage> {
        let query = build_query(page);
        debug!(url = %self.api_url, offset = page.offset, size = page.size, "fetching listings");

        let resp = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("X-API-Key", &self.api_key)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| Error::upstream(format!("listings request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::upstream(format!(
                "listings API returned {}: {}",
                status, body
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| Error::upstream(format!("listings response is not JSON: {}", e)))?;

        parse_envelope(&body)
    }
}

/// GraphQL query for one page of listings
pub fn build_query(page: &PageRequest) -> String {
    format!(
        "query {{ axies(sort: {}, from: {}, size: {}) {{ results {{ id name highestOffer {{ currentPriceUsd }} class stage }} }} }}",
        page.sort, page.offset, page.size
    )
}

/// Extract `data.axies.results`, decoding each item independently
pub fn parse_envelope(body: &Value) -> Result<ListingPage> {
    let results = body
        .get("data")
        .and_then(|data| data.get("axies"))
        .and_then(|axies| axies.get("results"));

    let items = match results {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => {
            if let Some(message) = first_graphql_error(body) {
                return Err(Error::upstream(format!("listings API error: {}", message)));
            }
            // A null list is an empty page, not a broken envelope
            if results.is_some() {
                return Ok(ListingPage::default());
            }
            return Err(Error::upstream(
                "malformed listings envelope: missing data.axies.results",
            ));
        }
        Some(other) => {
            return Err(Error::upstream(format!(
                "malformed listings envelope: results is not an array ({})",
                other
            )))
        }
    };

    let mut page = ListingPage::default();
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<ListingRecord>(item.clone()) {
            Ok(record) => page.records.push(record),
            Err(e) => {
                warn!(index, error = %e, "skipping undecodable listing");
                page.rejected += 1;
            }
        }
    }

    Ok(page)
}

fn first_graphql_error(body: &Value) -> Option<String> {
    body.get("errors")?
        .as_array()?
        .first()
        .map(|err| {
            err.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_carries_page_parameters() {
        let query = build_query(&PageRequest::default());
        assert!(query.contains("axies(sort: PriceAsc, from: 0, size: 300)"));
        assert!(query.contains("highestOffer { currentPriceUsd }"));
    }

    #[test]
    fn test_parse_envelope_keeps_good_items() {
        let body = json!({
            "data": { "axies": { "results": [
                { "id": "1", "name": "One", "highestOffer": { "currentPriceUsd": "2.5" }, "class": "Beast", "stage": 4 },
                { "id": "2", "name": 17, "class": "Bird", "stage": 4 },
                { "id": "3", "name": "Three", "highestOffer": null, "class": "Plant", "stage": 1 }
            ] } }
        });

        let page = parse_envelope(&body).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.rejected, 1, "name with the wrong type should be rejected");
        assert_eq!(page.total(), 3);
        assert_eq!(page.records[1].name.as_deref(), Some("Three"));
    }

    #[test]
    fn test_parse_envelope_empty_results() {
        let body = json!({ "data": { "axies": { "results": [] } } });
        let page = parse_envelope(&body).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_parse_envelope_null_results_is_empty_page() {
        let body = json!({ "data": { "axies": { "results": null } } });
        let page = parse_envelope(&body).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.rejected, 0);

        // With GraphQL errors attached a null list is still a failure
        let failed = json!({
            "data": { "axies": { "results": null } },
            "errors": [ { "message": "rate limited" } ]
        });
        let err = parse_envelope(&failed).unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_parse_envelope_malformed() {
        let missing = json!({ "data": {} });
        assert!(matches!(parse_envelope(&missing), Err(Error::UpstreamUnavailable(_))));

        let not_array = json!({ "data": { "axies": { "results": "nope" } } });
        assert!(matches!(parse_envelope(&not_array), Err(Error::UpstreamUnavailable(_))));
    }

    #[test]
    fn test_parse_envelope_surfaces_graphql_error() {
        let body = json!({ "data": null, "errors": [ { "message": "Invalid API key" } ] });
        let err = parse_envelope(&body).unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
    }
}
