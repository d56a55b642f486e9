use std::{fmt::Debug, sync::Mutex, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::LocationError,
    model::{Coordinates, Position},
};

/// How long to wait for a fix and how old a cached fix may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(15_000),
            maximum_age: Duration::from_millis(60_000),
        }
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    /// Returns the current position. Implementations may answer with a cached
    /// fix no older than `maximum_age`.
    async fn current_position(&self, maximum_age: Duration) -> Result<Position, LocationError>;
}

/// Ask `provider` for a position, giving up after `options.timeout` and
/// refusing fixes older than `options.maximum_age`.
pub async fn locate(
    provider: &dyn LocationProvider,
    options: &PositionOptions,
) -> Result<Position, LocationError> {
    let position =
        tokio::time::timeout(options.timeout, provider.current_position(options.maximum_age))
            .await
            .map_err(|_| LocationError::Timeout)??;

    if is_stale(position.timestamp, Utc::now(), options.maximum_age) {
        return Err(LocationError::Unavailable(format!(
            "last fix from {} is older than {:?}",
            position.timestamp, options.maximum_age
        )));
    }

    Ok(position)
}

fn is_stale(taken: DateTime<Utc>, now: DateTime<Utc>, maximum_age: Duration) -> bool {
    // A fix stamped in the future counts as fresh.
    match now.signed_duration_since(taken).to_std() {
        Ok(age) => age > maximum_age,
        Err(_) => false,
    }
}

/// A location known up front (configuration or command-line arguments).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coords: Coordinates,
}

impl FixedLocation {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self, _maximum_age: Duration) -> Result<Position, LocationError> {
        Ok(Position::now(self.coords))
    }
}

/// Remembers the most recent fix.
#[derive(Debug, Default)]
pub struct PositionCache {
    last: Mutex<Option<Position>>,
}

impl PositionCache {
    pub fn fresh(&self, maximum_age: Duration) -> Option<Position> {
        let last = *self.last.lock().ok()?;
        last.filter(|pos| !is_stale(pos.timestamp, Utc::now(), maximum_age))
    }

    pub fn store(&self, position: Position) {
        if let Ok(mut last) = self.last.lock() {
            *last = Some(position);
        }
    }
}

/// Coarse geolocation derived from the host's public IP address.
#[derive(Debug)]
pub struct IpLocation {
    http: Client,
    endpoint: String,
    cache: PositionCache,
}

impl IpLocation {
    pub const DEFAULT_ENDPOINT: &'static str = "http://ip-api.com/json";

    pub fn new() -> Self {
        Self::with_endpoint(Self::DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_endpoint(endpoint: String) -> Self {
        Self { http: Client::new(), endpoint, cache: PositionCache::default() }
    }

    async fn lookup(&self) -> Result<Position, LocationError> {
        let res = self
            .http
            .get(&self.endpoint)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(format!("IP geolocation request failed: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| LocationError::Unavailable(format!("failed to read IP geolocation body: {e}")))?;

        if !status.is_success() {
            return Err(LocationError::Unavailable(format!(
                "IP geolocation request failed with status {status}"
            )));
        }

        parse_ip_lookup(&body).map(Position::now)
    }
}

impl Default for IpLocation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for IpLocation {
    async fn current_position(&self, maximum_age: Duration) -> Result<Position, LocationError> {
        if let Some(cached) = self.cache.fresh(maximum_age) {
            debug!(coords = %cached.coords, "reusing cached IP location");
            return Ok(cached);
        }

        let position = self.lookup().await?;
        self.cache.store(position);
        Ok(position)
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

fn parse_ip_lookup(body: &str) -> Result<Coordinates, LocationError> {
    let parsed: IpApiResponse = serde_json::from_str(body)
        .map_err(|e| LocationError::Unavailable(format!("invalid IP geolocation JSON: {e}")))?;

    if parsed.status != "success" {
        let reason = parsed.message.unwrap_or_else(|| "unknown reason".to_string());
        return Err(LocationError::Unavailable(format!("IP geolocation failed: {reason}")));
    }

    match (parsed.lat, parsed.lon) {
        (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
        _ => Err(LocationError::Unavailable("IP geolocation response had no coordinates".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct SlowProvider;

    #[async_trait]
    impl LocationProvider for SlowProvider {
        async fn current_position(&self, _: Duration) -> Result<Position, LocationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Position::now(Coordinates::new(0.0, 0.0)))
        }
    }

    #[derive(Debug)]
    struct StaleProvider;

    #[async_trait]
    impl LocationProvider for StaleProvider {
        async fn current_position(&self, _: Duration) -> Result<Position, LocationError> {
            Ok(Position {
                coords: Coordinates::new(1.0, 2.0),
                timestamp: Utc::now() - chrono::Duration::minutes(5),
            })
        }
    }

    #[test]
    fn default_options_match_watch_companion() {
        let opts = PositionOptions::default();
        assert_eq!(opts.timeout, Duration::from_millis(15_000));
        assert_eq!(opts.maximum_age, Duration::from_millis(60_000));
    }

    #[tokio::test]
    async fn fixed_location_returns_its_coordinates() {
        let provider = FixedLocation::new(Coordinates::new(37.7749, -122.4194));
        let pos = locate(&provider, &PositionOptions::default()).await.unwrap();
        assert_eq!(pos.coords, Coordinates::new(37.7749, -122.4194));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let opts = PositionOptions { timeout: Duration::from_millis(20), ..Default::default() };
        let err = locate(&SlowProvider, &opts).await.unwrap_err();
        assert_eq!(err, LocationError::Timeout);
    }

    #[tokio::test]
    async fn stale_fix_is_rejected() {
        let err = locate(&StaleProvider, &PositionOptions::default()).await.unwrap_err();
        assert!(matches!(err, LocationError::Unavailable(_)));
    }

    #[test]
    fn cache_only_returns_fresh_fix() {
        let cache = PositionCache::default();
        assert!(cache.fresh(Duration::from_secs(60)).is_none());

        cache.store(Position {
            coords: Coordinates::new(1.0, 2.0),
            timestamp: Utc::now() - chrono::Duration::seconds(30),
        });
        assert!(cache.fresh(Duration::from_secs(60)).is_some());
        assert!(cache.fresh(Duration::from_secs(10)).is_none());
    }

    #[test]
    fn parses_ip_lookup_success() {
        let coords =
            parse_ip_lookup(r#"{"status":"success","lat":52.37,"lon":4.89}"#).unwrap();
        assert_eq!(coords, Coordinates::new(52.37, 4.89));
    }

    #[test]
    fn ip_lookup_failure_carries_reason() {
        let err = parse_ip_lookup(r#"{"status":"fail","message":"private range"}"#).unwrap_err();
        assert!(err.to_string().contains("private range"));
    }
}
