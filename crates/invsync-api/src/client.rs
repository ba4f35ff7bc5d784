// Async HTTP client for Nautobot-compatible inventory REST APIs.
//
// Base path: /api/
// Auth: `Authorization: Token <token>` header

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::Page;

/// Page size requested from list endpoints.
const PAGE_LIMIT: u32 = 250;

// ── Endpoints ────────────────────────────────────────────────────────

/// REST collections the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Locations,
    LocationTypes,
    Devices,
    DeviceTypes,
    Manufacturers,
    Roles,
    Platforms,
    Interfaces,
    Prefixes,
    IpAddresses,
    Namespaces,
    Vrfs,
    Circuits,
    Providers,
    CircuitTypes,
    Statuses,
}

impl Endpoint {
    /// Collection path relative to `/api/`, with trailing slash.
    pub fn path(self) -> &'static str {
        match self {
            Self::Locations => "dcim/locations/",
            Self::LocationTypes => "dcim/location-types/",
            Self::Devices => "dcim/devices/",
            Self::DeviceTypes => "dcim/device-types/",
            Self::Manufacturers => "dcim/manufacturers/",
            Self::Roles => "extras/roles/",
            Self::Platforms => "dcim/platforms/",
            Self::Interfaces => "dcim/interfaces/",
            Self::Prefixes => "ipam/prefixes/",
            Self::IpAddresses => "ipam/ip-addresses/",
            Self::Namespaces => "ipam/namespaces/",
            Self::Vrfs => "ipam/vrfs/",
            Self::Circuits => "circuits/circuits/",
            Self::Providers => "circuits/providers/",
            Self::CircuitTypes => "circuits/circuit-types/",
            Self::Statuses => "extras/statuses/",
        }
    }
}

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the inventory REST API.
///
/// Every request carries the token header; reads ask for `depth=2` so
/// related objects arrive with their natural keys inlined.
pub struct InventoryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl InventoryClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API token and transport config.
    pub fn from_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid API token header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL ends in `/api/`.
    ///
    /// Accepts `https://host`, `https://host/`, and `https://host/api`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    async fn get_url<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let url = Url::parse(url)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::InvalidToken {
                url: self.base_url.to_string(),
                status: status.as_u16(),
            };
        }

        let raw = resp.text().await.unwrap_or_default();

        // `{"detail": "..."}` for generic failures; field-keyed maps for
        // validation errors, which are passed through verbatim.
        let message = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(ErrorResponse {
                detail: Some(detail),
            }) => detail,
            _ if raw.is_empty() => status.to_string(),
            _ => raw,
        };

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fetch every record of a collection matching `filters`.
    ///
    /// Follows `next` links until the server stops returning them or the
    /// advertised `count` is reached.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, Error> {
        let mut params: Vec<(&str, String)> = filters.to_vec();
        params.push(("depth", "2".into()));
        params.push(("limit", PAGE_LIMIT.to_string()));

        let mut page: Page<T> = self.get_with_params(endpoint.path(), &params).await?;
        let mut all = Vec::with_capacity(usize::try_from(page.count).unwrap_or(0));

        loop {
            let received = page.results.len();
            all.extend(page.results);

            let done = received == 0
                || u64::try_from(all.len()).unwrap_or(u64::MAX) >= page.count;
            match page.next {
                Some(next) if !done => {
                    page = self.get_url(&next).await?;
                }
                _ => break,
            }
        }

        debug!(endpoint = endpoint.path(), count = all.len(), "listed collection");
        Ok(all)
    }

    /// Fetch the single record matching `filters`, if any.
    pub async fn find_one<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        filters: &[(&str, String)],
    ) -> Result<Option<T>, Error> {
        let mut params: Vec<(&str, String)> = filters.to_vec();
        params.push(("depth", "2".into()));
        params.push(("limit", "2".into()));

        let page: Page<T> = self.get_with_params(endpoint.path(), &params).await?;
        if page.count > 1 {
            warn!(
                endpoint = endpoint.path(),
                ?filters,
                count = page.count,
                "lookup matched more than one record, using the first"
            );
        }
        Ok(page.results.into_iter().next())
    }

    /// Create a record and return the server's representation of it.
    pub async fn create<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<T, Error> {
        self.post(endpoint.path(), body).await
    }

    /// Partially update the record `id`.
    pub async fn update<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: Endpoint,
        id: &Uuid,
        body: &B,
    ) -> Result<T, Error> {
        self.patch(&format!("{}{id}/", endpoint.path()), body).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_api_suffix() {
        let url = InventoryClient::normalize_base_url("https://nautobot.example.com").unwrap();
        assert_eq!(url.as_str(), "https://nautobot.example.com/api/");

        let url = InventoryClient::normalize_base_url("https://nautobot.example.com/api").unwrap();
        assert_eq!(url.as_str(), "https://nautobot.example.com/api/");

        let url = InventoryClient::normalize_base_url("https://host/nautobot/api/").unwrap();
        assert_eq!(url.as_str(), "https://host/nautobot/api/");
    }

    #[test]
    fn endpoint_paths_join_under_api() {
        let base = InventoryClient::normalize_base_url("https://host").unwrap();
        let url = base.join(Endpoint::IpAddresses.path()).unwrap();
        assert_eq!(url.as_str(), "https://host/api/ipam/ip-addresses/");
    }
}
