use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Timelike};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::SyncError,
    model::{Coordinates, SunTimes},
};

pub const DEFAULT_ENDPOINT: &str = "http://api.sunrise-sunset.org/json";

const DESCRIPTION: &str = "Sunrise/sunset";

/// Build the lookup URL for `coords`, asking for unformatted ISO-8601 times.
pub fn sun_data_url(endpoint: &str, coords: &Coordinates) -> String {
    format!("{endpoint}?lat={}&lng={}&formatted=0", coords.latitude, coords.longitude)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    Failure,
}

/// Status 0 (no response) and anything above 300 fail. Everything in 1..=300
/// counts as success, so informational and `300 Multiple Choices` bodies go
/// straight to the JSON parser.
pub fn classify_status(status: u16) -> ResponseClass {
    if status == 0 || status > 300 { ResponseClass::Failure } else { ResponseClass::Success }
}

/// Raw outcome of a GET. A request that never got a response has status 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    pub fn no_response(reason: impl Into<String>) -> Self {
        Self { status: 0, status_text: reason.into(), body: String::new() }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    async fn get(&self, url: &str) -> HttpResponse;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> HttpResponse {
        let res = match self.http.get(url).send().await {
            Ok(res) => res,
            Err(e) => return HttpResponse::no_response(e.to_string()),
        };

        let status = res.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();

        match res.text().await {
            Ok(body) => HttpResponse { status: status.as_u16(), status_text, body },
            Err(e) => HttpResponse::no_response(format!("failed to read response body: {e}")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SunApiResponse {
    results: SunApiResults,
}

#[derive(Debug, Deserialize)]
struct SunApiResults {
    sunrise: String,
    sunset: String,
}

/// Hour and minute of `timestamp` on the wall clock of `tz`.
pub fn local_hour_minute<Tz: TimeZone>(timestamp: &str, tz: &Tz) -> Result<(u8, u8), SyncError> {
    let instant = DateTime::parse_from_rfc3339(timestamp).map_err(|e| {
        SyncError::MalformedResponse(format!("invalid timestamp '{timestamp}': {e}"))
    })?;
    let local = instant.with_timezone(tz);

    // hour() < 24 and minute() < 60, so the narrowing never truncates.
    Ok((local.hour() as u8, local.minute() as u8))
}

/// Parse a sunrise-sunset.org body into local [`SunTimes`].
pub fn parse_sun_times<Tz: TimeZone>(body: &str, tz: &Tz) -> Result<SunTimes, SyncError> {
    let parsed: SunApiResponse = serde_json::from_str(body)
        .map_err(|e| SyncError::MalformedResponse(format!("{e}: {}", truncate_body(body))))?;

    let (sunrise_hour, sunrise_minute) = local_hour_minute(&parsed.results.sunrise, tz)?;
    debug!(sunrise = %parsed.results.sunrise, sunrise_hour, sunrise_minute, "received sunrise");

    let (sunset_hour, sunset_minute) = local_hour_minute(&parsed.results.sunset, tz)?;
    debug!(sunset = %parsed.results.sunset, sunset_hour, sunset_minute, "received sunset");

    Ok(SunTimes { sunrise_hour, sunrise_minute, sunset_hour, sunset_minute })
}

/// Turn a raw response into sun times, classifying it first.
pub fn interpret_response<Tz: TimeZone>(
    response: &HttpResponse,
    tz: &Tz,
) -> Result<SunTimes, SyncError> {
    match classify_status(response.status) {
        ResponseClass::Failure => Err(SyncError::TransportFailure {
            description: DESCRIPTION.to_string(),
            status_text: response.status_text.clone(),
        }),
        ResponseClass::Success => parse_sun_times(&response.body, tz),
    }
}

/// Looks up sunrise and sunset for a position with a single GET.
#[derive(Debug)]
pub struct SunTimeFetcher {
    transport: Box<dyn HttpTransport>,
    endpoint: String,
}

impl SunTimeFetcher {
    pub fn new(transport: Box<dyn HttpTransport>, endpoint: impl Into<String>) -> Self {
        Self { transport, endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn fetch<Tz: TimeZone>(
        &self,
        coords: &Coordinates,
        tz: &Tz,
    ) -> Result<SunTimes, SyncError> {
        let url = sun_data_url(&self.endpoint, coords);
        debug!(%url, "requesting sun data");

        let response = self.transport.get(&url).await;
        let result = interpret_response(&response, tz);

        if let Err(err) = &result {
            warn!(status = response.status, "{err}");
        }
        result
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
