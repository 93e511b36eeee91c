use std::time::Duration;

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use tokio::time::timeout;
use wreq::Client;

use crate::postal::PostalCode;
use crate::resolver::{CoordinateResolver, ResolveError};
use crate::types::Coordinate;

/// HeartRails Geo API, which resolves Japanese postal codes without an API key
pub const DEFAULT_ENDPOINT: &str = "https://geoapi.heartrails.com/api/json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for HttpResolver
#[derive(Debug, Clone)]
pub struct HttpResolverConfig {
    /// Base URL of a HeartRails-compatible `searchByPostal` endpoint
    pub endpoint: String,
    /// Upper bound for one lookup, connection included
    pub timeout: Duration,
}

impl Default for HttpResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Response envelope: `{"response": {"location": [...]}}` or
/// `{"response": {"error": "..."}}`
#[derive(Debug, Deserialize)]
struct GeoApiResponse {
    response: GeoApiBody,
}

#[derive(Debug, Deserialize)]
struct GeoApiBody {
    #[serde(default)]
    location: Vec<GeoApiLocation>,
    #[serde(default)]
    error: Option<String>,
}

/// Coordinates arrive as decimal strings; `x` is longitude, `y` latitude
#[derive(Debug, Deserialize)]
struct GeoApiLocation {
    x: String,
    y: String,
    #[serde(default)]
    prefecture: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
}

/// Resolves postal codes through an HTTP geocoding service
pub struct HttpResolver {
    http_client: Client,
    config: HttpResolverConfig,
}

impl HttpResolver {
    pub fn new() -> Result<Self> {
        Self::with_config(HttpResolverConfig::default())
    }

    pub fn with_config(config: HttpResolverConfig) -> Result<Self> {
        let http_client = Client::builder().gzip(true).brotli(true).zstd(true).build()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &HttpResolverConfig {
        &self.config
    }

    fn request_url(&self, code: &PostalCode) -> String {
        format!(
            "{}?method=searchByPostal&postal={}",
            self.config.endpoint.trim_end_matches('/'),
            code.digits()
        )
    }

    async fn lookup(&self, code: &PostalCode) -> Result<Coordinate, ResolveError> {
        let url = self.request_url(code);
        tracing::debug!("Resolving postal code {} via {}", code, url);

        let body = timeout(self.config.timeout, async {
            let response = self
                .http_client
                .get(&url)
                .send()
                .await
                .map_err(|e| ResolveError::Unavailable(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ResolveError::Unavailable(format!("HTTP {}", status)));
            }

            let text = response
                .text()
                .await
                .map_err(|e| ResolveError::Unavailable(e.to_string()))?;
            Ok::<_, ResolveError>(text)
        })
        .await
        .map_err(|_| {
            ResolveError::Unavailable(format!(
                "timed out after {}s",
                self.config.timeout.as_secs_f64()
            ))
        })??;

        let coordinate = parse_response(&body, code)?;
        tracing::debug!("Postal code {} resolved to {}", code, coordinate);
        Ok(coordinate)
    }
}

impl CoordinateResolver for HttpResolver {
    fn resolve<'a>(&'a self, code: &'a PostalCode) -> BoxFuture<'a, Result<Coordinate, ResolveError>> {
        self.lookup(code).boxed()
    }
}

/// Extract the first location from a geocoder response body
fn parse_response(body: &str, code: &PostalCode) -> Result<Coordinate, ResolveError> {
    let parsed: GeoApiResponse =
        serde_json::from_str(body).map_err(|e| ResolveError::InvalidResponse {
            message: e.to_string(),
        })?;

    if let Some(error) = parsed.response.error {
        tracing::debug!("Geocoder reported '{}' for {}", error, code);
        return Err(ResolveError::NotFound(code.clone()));
    }

    let location = parsed
        .response
        .location
        .into_iter()
        .next()
        .ok_or_else(|| ResolveError::NotFound(code.clone()))?;

    let parse_degrees = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| ResolveError::InvalidResponse {
                message: format!("{} is not a number: '{}'", field, value),
            })
    };

    let latitude = parse_degrees("y", &location.y)?;
    let longitude = parse_degrees("x", &location.x)?;

    if let (Some(prefecture), Some(city)) = (&location.prefecture, &location.city) {
        tracing::debug!(
            "{} is in {}{}{}",
            code,
            prefecture,
            city,
            location.town.as_deref().unwrap_or("")
        );
    }

    Ok(Coordinate::new(latitude, longitude))
}
