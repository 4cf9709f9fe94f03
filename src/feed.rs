//! The geospatial feed boundary: one bounding-box query per category,
//! answered with a GeoJSON-shaped `FeatureCollection`.
//!
//! Clients are plain values built from `Config` and passed into each
//! resolver call; nothing here is process-global.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::config::Config;
use crate::error::Error;
use crate::types::{Area, Category, Coordinates, Origin};

/// One feature from a feed response. Properties stay untyped until a
/// category-specific reader interprets them.
#[derive(Debug, Clone)]
pub struct Feature {
    /// `geometry.coordinates`, when present and shaped `[lon, lat]`.
    pub coordinates: Option<Coordinates>,
    /// Raw `properties` object (or `null`).
    pub properties: Value,
}

impl Feature {
    /// Read one array element; anything that isn't an object yields an empty feature.
    fn from_value(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return Self {
                coordinates: None,
                properties: Value::Null,
            };
        };
        let coordinates = object
            .get("geometry")
            .and_then(|g| return g.get("coordinates"))
            .and_then(Value::as_array)
            .and_then(|position| return position_lon_lat(position))
            .map(Coordinates::from);
        let properties = object.remove("properties").unwrap_or(Value::Null);
        return Self {
            coordinates,
            properties,
        };
    }
}

/// Features returned by one feed query, in response order.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    /// Candidate features.
    pub features: Vec<Feature>,
    /// The response had no `features` array at all; `features` is empty.
    pub malformed: bool,
}

impl FeatureCollection {
    /// Interpret a decoded response body. A missing or non-array `features`
    /// is not an error: it reads as zero candidates, flagged `malformed`.
    pub fn from_value(category: Category, body: Value) -> Self {
        let features = match body {
            Value::Object(mut root) => root.remove("features"),
            _ => None,
        };
        let Some(Value::Array(items)) = features else {
            tracing::warn!(%category, "feed response has no features array, treating as empty");
            return Self {
                features: Vec::new(),
                malformed: true,
            };
        };
        return Self {
            features: items.into_iter().map(Feature::from_value).collect(),
            malformed: false,
        };
    }
}

/// Source of candidate features. Implementations perform exactly one fetch
/// per call and never retry.
#[async_trait]
pub trait Feed: Send + Sync {
    /// Fetch every feature of `query.category` around `query.origin`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` when the feed cannot be reached or answers
    /// with a failure; implementations reading local data return their own I/O errors.
    async fn fetch(&self, query: &FeedQuery) -> Result<FeatureCollection, Error>;
}

/// Parameters of one feed request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedQuery {
    /// Which endpoint to query.
    pub category: Category,
    /// Center of the search box.
    pub origin: Origin,
}

impl FeedQuery {
    /// Query-string pairs: `lat`/`lon` always, `width`/`height` only for
    /// categories whose endpoint takes a box size.
    pub fn query_pairs(&self, area: Area) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lat", self.origin.lat.to_string()),
            ("lon", self.origin.lon.to_string()),
        ];
        if self.category.sends_area() {
            pairs.push(("width", area.width.to_string()));
            pairs.push(("height", area.height.to_string()));
        }
        return pairs;
    }
}

/// Feed served from `<dir>/<segment>.json` files, one per category.
/// The origin is ignored; each file is the full candidate set.
pub struct FixtureFeed {
    /// Directory holding the fixture files.
    dir: PathBuf,
}

impl FixtureFeed {
    /// Serve fixtures from `dir`.
    pub const fn new(dir: PathBuf) -> Self {
        return Self { dir };
    }
}

#[async_trait]
impl Feed for FixtureFeed {
    async fn fetch(&self, query: &FeedQuery) -> Result<FeatureCollection, Error> {
        let path = self.dir.join(format!("{}.json", query.category.feed_segment()));
        tracing::debug!(category = %query.category, path = %path.display(), "reading fixture feed");
        let content = match tokio::fs::read_to_string(&path).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FixtureNotFound { path });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        let body: Value = serde_json::from_str(&content)?;
        return Ok(FeatureCollection::from_value(query.category, body));
    }
}

/// Feed reached over HTTP at `{base_url}/{segment}`.
pub struct HttpFeed {
    /// Box size sent with event and transport queries.
    area: Area,
    /// Base URL without a trailing slash.
    base_url: String,
    /// Shared connection pool; carries timeout and user agent.
    client: reqwest::Client,
}

impl HttpFeed {
    /// Full endpoint URL for a category.
    fn endpoint(&self, category: Category) -> String {
        return format!("{}/{}", self.base_url, category.feed_segment());
    }

    /// Build a client from config: base URL, timeout, user agent and box size.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                return Error::ConfigInvalid {
                    reason: format!("http client: {e}"),
                };
            })?;
        return Ok(Self {
            area: config.area,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        });
    }
}

#[async_trait]
impl Feed for HttpFeed {
    async fn fetch(&self, query: &FeedQuery) -> Result<FeatureCollection, Error> {
        let category = query.category;
        let url = self.endpoint(category);
        let network = |e: reqwest::Error| {
            return Error::Network {
                category,
                reason: e.to_string(),
            };
        };

        tracing::debug!(%category, %url, lat = query.origin.lat, lon = query.origin.lon, "fetching feed");
        let response = self
            .client
            .get(&url)
            .query(&query.query_pairs(self.area))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network {
                category,
                reason: format!("feed returned {status}"),
            });
        }

        let body: Value = response.json().await.map_err(network)?;
        return Ok(FeatureCollection::from_value(category, body));
    }
}

/// `[lon, lat]` from a GeoJSON position; a trailing altitude is ignored.
fn position_lon_lat(position: &[Value]) -> Option<[f64; 2]> {
    let [lon, lat, ..] = position else {
        return None;
    };
    return Some([lon.as_f64()?, lat.as_f64()?]);
}
