//! Remote designs API client
//!
//! Two endpoints are used: a paginated listing that returns summaries, and
//! a batch endpoint returning full designs for at most [`MAX_BATCH`] slugs.

use crate::config::schema::CatalogConfig;
use crate::error::{SpoolError, SpoolResult};
use crate::inventory::Design;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Largest slug list the batch endpoint accepts
pub const MAX_BATCH: usize = 20;

/// Listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
    pub query: Option<String>,
}

impl ListQuery {
    /// First page of `limit` designs, unfiltered
    pub fn first(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            category: None,
            query: None,
        }
    }
}

/// Basic design info returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSummary {
    pub slug: String,
    #[serde(default)]
    pub title: String,
}

/// Listing response envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub data: Vec<DesignSummary>,
}

/// Batch response envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub data: Vec<Design>,
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    slugs: &'a [String],
    locale: &'a str,
}

/// The remote design catalog
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// List design summaries
    async fn list(&self, query: &ListQuery) -> SpoolResult<ListResponse>;

    /// Fetch full designs for up to [`MAX_BATCH`] slugs
    async fn batch(&self, slugs: &[String], locale: &str) -> SpoolResult<BatchResponse>;
}

/// HTTP implementation over `ureq`
pub struct HttpCatalog {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl HttpCatalog {
    /// Build a client from configuration
    pub fn from_config(config: &CatalogConfig) -> SpoolResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SpoolError::ApiKeyMissing)?;

        let agent_config = ureq::Agent::config_builder()
            .timeout_global(config.timeout())
            .build();

        Ok(Self {
            agent: agent_config.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Map a ureq failure to the catalog error for it
fn api_error(err: ureq::Error) -> SpoolError {
    match err {
        ureq::Error::StatusCode(code) => SpoolError::ApiStatus(code),
        other => SpoolError::ApiTransport(other.to_string()),
    }
}

#[async_trait]
impl CatalogApi for HttpCatalog {
    async fn list(&self, query: &ListQuery) -> SpoolResult<ListResponse> {
        info!("API GET /designs page={} limit={}", query.page, query.limit);

        let agent = self.agent.clone();
        let url = self.endpoint("/designs");
        let auth = format!("Bearer {}", self.api_key);
        let query = query.clone();

        let body = tokio::task::spawn_blocking(move || -> SpoolResult<String> {
            let mut request = agent
                .get(&url)
                .header("Authorization", &auth)
                .header("Content-Type", "application/json")
                .query("page", query.page.to_string())
                .query("limit", query.limit.to_string());
            if let Some(category) = &query.category {
                request = request.query("category", category);
            }
            if let Some(q) = &query.query {
                request = request.query("query", q);
            }

            let mut response = request.call().map_err(api_error)?;
            response
                .body_mut()
                .read_to_string()
                .map_err(|e| SpoolError::ApiTransport(e.to_string()))
        })
        .await
        .map_err(|e| SpoolError::Task(e.to_string()))??;

        Ok(serde_json::from_str(&body)?)
    }

    async fn batch(&self, slugs: &[String], locale: &str) -> SpoolResult<BatchResponse> {
        info!("API POST /designs/batch {} slugs", slugs.len());

        let agent = self.agent.clone();
        let url = self.endpoint("/designs/batch");
        let auth = format!("Bearer {}", self.api_key);
        let payload = serde_json::to_string(&BatchRequest { slugs, locale })?;

        let body = tokio::task::spawn_blocking(move || -> SpoolResult<String> {
            let mut response = agent
                .post(&url)
                .header("Authorization", &auth)
                .header("Content-Type", "application/json")
                .send(payload.as_str())
                .map_err(api_error)?;
            response
                .body_mut()
                .read_to_string()
                .map_err(|e| SpoolError::ApiTransport(e.to_string()))
        })
        .await
        .map_err(|e| SpoolError::Task(e.to_string()))??;

        Ok(serde_json::from_str(&body)?)
    }
}

/// Split slugs into batch-sized groups, preserving order
pub fn chunk_slugs(slugs: &[String], batch_size: usize) -> Vec<&[String]> {
    let size = batch_size.clamp(1, MAX_BATCH);
    slugs.chunks(size).collect()
}

/// Pull `total` designs: list once, then batch-fetch details in order
///
/// `on_batch` is called after every batch with (fetched so far, slug count).
pub async fn load_designs<F>(
    api: &dyn CatalogApi,
    total: u32,
    batch_size: usize,
    locale: &str,
    mut on_batch: F,
) -> SpoolResult<Vec<Design>>
where
    F: FnMut(usize, usize) + Send,
{
    let listing = api.list(&ListQuery::first(total)).await?;
    let slugs: Vec<String> = listing.data.into_iter().map(|d| d.slug).collect();

    if slugs.is_empty() {
        debug!("Design listing is empty");
        return Ok(Vec::new());
    }

    let mut designs = Vec::with_capacity(slugs.len());
    let mut done = 0;
    for chunk in chunk_slugs(&slugs, batch_size) {
        let batch = api.batch(chunk, locale).await?;
        designs.extend(batch.data);
        done += chunk.len();
        on_batch(done, slugs.len());
    }

    info!("Loaded {} designs", designs.len());
    Ok(designs)
}

/// Find a design by slug through the batch endpoint
pub async fn find_design(api: &dyn CatalogApi, slug: &str, locale: &str) -> SpoolResult<Design> {
    let response = api.batch(&[slug.to_string()], locale).await?;
    response
        .data
        .into_iter()
        .find(|d| d.slug == slug)
        .ok_or_else(|| SpoolError::DesignNotFound(slug.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Catalog serving `count` generated designs
    pub(crate) struct FakeCatalog {
        pub(crate) designs: Vec<Design>,
        pub(crate) batches: Mutex<Vec<usize>>,
        pub(crate) fail_with: Option<u16>,
    }

    impl FakeCatalog {
        pub(crate) fn with_designs(designs: Vec<Design>) -> Self {
            Self {
                designs,
                batches: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        pub(crate) fn generated(count: usize) -> Self {
            Self::with_designs(
                (0..count)
                    .map(|i| Design::new(format!("design-{i}"), format!("Design {i}")))
                    .collect(),
            )
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogApi for FakeCatalog {
        async fn list(&self, query: &ListQuery) -> SpoolResult<ListResponse> {
            if let Some(code) = self.fail_with {
                return Err(SpoolError::ApiStatus(code));
            }
            Ok(ListResponse {
                data: self
                    .designs
                    .iter()
                    .take(query.limit as usize)
                    .map(|d| DesignSummary {
                        slug: d.slug.clone(),
                        title: d.title.clone(),
                    })
                    .collect(),
            })
        }

        async fn batch(&self, slugs: &[String], _locale: &str) -> SpoolResult<BatchResponse> {
            assert!(slugs.len() <= MAX_BATCH);
            self.batches.lock().unwrap().push(slugs.len());
            Ok(BatchResponse {
                data: self
                    .designs
                    .iter()
                    .filter(|d| slugs.contains(&d.slug))
                    .cloned()
                    .collect(),
            })
        }
    }

    #[test]
    fn chunks_cap_at_twenty() {
        let slugs: Vec<String> = (0..45).map(|i| i.to_string()).collect();

        let sizes: Vec<usize> = chunk_slugs(&slugs, 20).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);

        let sizes: Vec<usize> = chunk_slugs(&slugs, 100).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);

        assert_eq!(chunk_slugs(&slugs, 0).len(), 45);
    }

    #[tokio::test]
    async fn loads_in_batches_preserving_order() {
        let api = FakeCatalog::generated(60);
        let mut progress = Vec::new();

        let designs = load_designs(&api, 50, 20, "US", |done, total| progress.push((done, total)))
            .await
            .unwrap();

        assert_eq!(designs.len(), 50);
        assert_eq!(designs[0].slug, "design-0");
        assert_eq!(designs[49].slug, "design-49");
        assert_eq!(api.batch_sizes(), vec![20, 20, 10]);
        assert_eq!(progress, vec![(20, 50), (40, 50), (50, 50)]);
    }

    #[tokio::test]
    async fn empty_listing_skips_batches() {
        let api = FakeCatalog::generated(0);
        let designs = load_designs(&api, 50, 20, "US", |_, _| {}).await.unwrap();

        assert!(designs.is_empty());
        assert!(api.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn status_errors_propagate() {
        let mut api = FakeCatalog::generated(5);
        api.fail_with = Some(401);

        let err = load_designs(&api, 50, 20, "US", |_, _| {}).await.unwrap_err();
        assert_eq!(err.to_string(), "API Error: 401");
    }

    #[tokio::test]
    async fn find_design_by_slug() {
        let api = FakeCatalog::generated(3);

        let design = find_design(&api, "design-2", "US").await.unwrap();
        assert_eq!(design.title, "Design 2");

        let err = find_design(&api, "nope", "US").await.unwrap_err();
        assert!(matches!(err, SpoolError::DesignNotFound(_)));
    }

    #[test]
    fn http_catalog_requires_api_key() {
        let config = CatalogConfig::default();
        assert!(matches!(
            HttpCatalog::from_config(&config),
            Err(SpoolError::ApiKeyMissing)
        ));

        let config = CatalogConfig {
            api_key: Some("   ".to_string()),
            ..CatalogConfig::default()
        };
        assert!(HttpCatalog::from_config(&config).is_err());
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let config = CatalogConfig {
            base_url: "https://example.com/api/v1/".to_string(),
            api_key: Some("key".to_string()),
            ..CatalogConfig::default()
        };
        let client = HttpCatalog::from_config(&config).unwrap();
        assert_eq!(client.endpoint("/designs"), "https://example.com/api/v1/designs");
    }

    #[test]
    fn batch_response_parses_designs() {
        let json = r##"{"data":[{"slug":"pikachu-planter","title":"Pikachu Planter",
            "category":"planters","pokemon":{"name":"Pikachu"},
            "filaments":[{"filament_id":"pla-matte-lemon-yellow","color":"Lemon Yellow","weight_grams":42.5}]}]}"##;
        let parsed: BatchResponse = serde_json::from_str(json).unwrap();

        let design = &parsed.data[0];
        assert_eq!(design.category(), Some("planters"));
        assert_eq!(design.pokemon_name(), Some("Pikachu"));
        assert_eq!(design.filaments[0].weight(), 42.5);
    }
}
