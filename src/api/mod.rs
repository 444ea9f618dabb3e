//! HTTP client adapter for the two upstream APIs.
//!
//! This module defines the [`Upstream`] trait, the concrete [`ApiClient`]
//! that talks to the real endpoints, and the [`FetchFailure`] signal every
//! call collapses its errors into.  Wire types live in sub-modules
//! ([`school`] and [`news`]).
//!
//! Every call is a single best-effort attempt: no retry, no caching, no
//! backoff.  A successful body is returned as decoded, with one exception:
//! when a school search query is supplied the page is re-filtered locally
//! (see [`SchoolPage::retain_matching`]).

mod news;
mod school;

pub use news::{CategoryPath, NewsChannel, NewsPayload, NewsPost, NewsSource, SourceCatalog};
pub use school::{School, SchoolPage};

#[cfg(test)]
pub(crate) use news::tests::{make_post, make_source};
#[cfg(test)]
pub(crate) use school::tests::make_school;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Failure signal
// ---------------------------------------------------------------------------

/// Which upstream endpoint a call was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Schools,
    NewsCatalog,
    NewsPosts,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EndpointKind::Schools => "schools",
            EndpointKind::NewsCatalog => "news-catalog",
            EndpointKind::NewsPosts => "news-posts",
        })
    }
}

/// Why a call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never produced a response (DNS, connect, timeout, ...).
    Network,
    /// The upstream answered with a non-2xx status.
    HttpStatus(u16),
    /// A 2xx body that is not the JSON shape we expect.
    Decode,
    /// The request could not be built from the configured endpoint.
    InvalidRequest,
}

/// Uniform failure of a single upstream call.
///
/// Carries only owned strings so it can travel inside store actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{endpoint} request failed: {reason}")]
pub struct FetchFailure {
    pub endpoint: EndpointKind,
    pub kind: FailureKind,
    /// Human-readable reason, suitable for showing as-is.
    pub reason: String,
}

impl FetchFailure {
    pub fn new(endpoint: EndpointKind, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            endpoint,
            kind,
            reason: reason.into(),
        }
    }

    fn network(endpoint: EndpointKind, err: &reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            format!("could not connect: {err}")
        } else {
            err.to_string()
        };
        Self::new(endpoint, FailureKind::Network, reason)
    }
}

// ---------------------------------------------------------------------------
// Upstream trait
// ---------------------------------------------------------------------------

/// The three calls the stores need from the outside world.
///
/// The effect runner executes commands against this trait on `tokio` tasks,
/// so implementations must be shareable across threads.
pub trait Upstream: Send + Sync + 'static {
    /// Fetch one directory page.  A non-empty `query` narrows the returned
    /// page locally even when the upstream ignores it.
    fn fetch_schools(
        &self,
        page: u32,
        per_page: u32,
        query: Option<&str>,
    ) -> impl Future<Output = Result<SchoolPage, FetchFailure>> + Send;

    /// Fetch the aggregator's source catalog.
    fn fetch_news_sources(&self) -> impl Future<Output = Result<SourceCatalog, FetchFailure>> + Send;

    /// Fetch the posts of one source/category pair.
    fn fetch_news(
        &self,
        source: &str,
        category: &str,
    ) -> impl Future<Output = Result<NewsPayload, FetchFailure>> + Send;
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

/// Talks to the real directory and news endpoints over HTTP.
pub struct ApiClient {
    http: reqwest::Client,
    school_endpoint: Url,
    news_endpoint: Url,
}

impl ApiClient {
    /// Build a client for the given base URLs.
    ///
    /// `timeout` bounds each request end to end.
    pub fn new(school_endpoint: Url, news_endpoint: Url, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            school_endpoint,
            news_endpoint,
        })
    }

    /// URL of the posts endpoint for `source`/`category`.
    fn news_url(&self, source: &str, category: &str) -> Result<Url, FetchFailure> {
        let mut url = self.news_endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                FetchFailure::new(
                    EndpointKind::NewsPosts,
                    FailureKind::InvalidRequest,
                    format!("{} cannot carry a path", self.news_endpoint),
                )
            })?
            .pop_if_empty()
            .push(source)
            .push(category);
        Ok(url)
    }

    /// Send `request`, require a 2xx status, and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        endpoint: EndpointKind,
        request: reqwest::RequestBuilder,
    ) -> Result<T, FetchFailure> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchFailure::network(endpoint, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::new(
                endpoint,
                FailureKind::HttpStatus(status.as_u16()),
                format!("upstream responded with HTTP {status}"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::network(endpoint, &e))?;

        serde_json::from_slice(&body).map_err(|e| {
            FetchFailure::new(endpoint, FailureKind::Decode, format!("unexpected response body: {e}"))
        })
    }
}

impl Upstream for ApiClient {
    async fn fetch_schools(
        &self,
        page: u32,
        per_page: u32,
        query: Option<&str>,
    ) -> Result<SchoolPage, FetchFailure> {
        let query = query.filter(|q| !q.trim().is_empty());

        let mut params = vec![("page", page.to_string()), ("perPage", per_page.to_string())];
        if let Some(q) = query {
            params.push(("search", q.to_string()));
        }

        tracing::debug!(page, per_page, ?query, "fetching school page");
        let request = self.http.get(self.school_endpoint.clone()).query(&params);
        let mut school_page: SchoolPage = Self::get_json(EndpointKind::Schools, request).await?;

        if let Some(q) = query {
            school_page.retain_matching(q);
        }
        Ok(school_page)
    }

    async fn fetch_news_sources(&self) -> Result<SourceCatalog, FetchFailure> {
        tracing::debug!("fetching news source catalog");
        let request = self.http.get(self.news_endpoint.clone());
        Self::get_json(EndpointKind::NewsCatalog, request).await
    }

    async fn fetch_news(&self, source: &str, category: &str) -> Result<NewsPayload, FetchFailure> {
        let url = self.news_url(source, category)?;
        tracing::debug!(%url, "fetching news posts");
        Self::get_json(EndpointKind::NewsPosts, self.http.get(url)).await
    }
}

// ---------------------------------------------------------------------------
// Lenient decoding helpers
// ---------------------------------------------------------------------------

/// Decode `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A count that may arrive as a number, a numeric string, or `null`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientCount {
    Number(u64),
    Text(String),
    Null(()),
}

pub(crate) fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match LenientCount::deserialize(deserializer)? {
        LenientCount::Number(n) => Ok(n),
        LenientCount::Text(s) if s.trim().is_empty() => Ok(0),
        LenientCount::Text(s) => s.trim().parse().map_err(de::Error::custom),
        LenientCount::Null(()) => Ok(0),
    }
}

pub(crate) fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let n = lenient_u64(deserializer)?;
    u32::try_from(n).map_err(de::Error::custom)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr) -> ApiClient {
        ApiClient::new(
            Url::parse(&format!("http://{addr}/sekolah")).unwrap(),
            Url::parse(&format!("http://{addr}/")).unwrap(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    const THREE_SCHOOLS: &str = r#"{
        "dataSekolah": [
            { "id": "1", "npsn": "20100001", "sekolah": "SMA NEGERI 1 BANDUNG", "propinsi": "Prov. Jawa Barat", "kabupaten_kota": "Kota Bandung", "kecamatan": "Kec. Coblong", "alamat_jalan": "Jl. Juanda" },
            { "id": "2", "npsn": "50100002", "sekolah": "SMK PARIWISATA", "propinsi": "Prov. Bali", "kabupaten_kota": "Kota Denpasar", "kecamatan": "Kec. Denpasar Barat", "alamat_jalan": "Jl. Gatot Subroto" },
            { "id": "3", "npsn": "20100003", "sekolah": "SMP NEGERI 2 CIMAHI", "propinsi": "Prov. Jawa Barat", "kabupaten_kota": "Kota Cimahi", "kecamatan": "Kec. Cimahi Tengah", "alamat_jalan": "Jl. Sriwijaya" }
        ],
        "total_data": 250,
        "page": 1,
        "per_page": 3
    }"#;

    async fn school_server() -> (SocketAddr, Captured) {
        let captured: Captured = Arc::default();
        let sink = Arc::clone(&captured);
        let router = Router::new().route(
            "/sekolah",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(params);
                    (
                        [("content-type", "application/json")],
                        THREE_SCHOOLS,
                    )
                }
            }),
        );
        (serve(router).await, captured)
    }

    #[tokio::test]
    async fn fetch_schools_sends_paging_and_returns_body_unmodified() {
        let (addr, captured) = school_server().await;
        let client = client_for(addr);

        let page = client.fetch_schools(2, 3, None).await.unwrap();

        assert_eq!(page.schools.len(), 3);
        assert_eq!(page.total_data, 250);

        let params = captured.lock().unwrap();
        assert_eq!(params[0].get("page").map(String::as_str), Some("2"));
        assert_eq!(params[0].get("perPage").map(String::as_str), Some("3"));
        assert!(!params[0].contains_key("search"));
    }

    #[tokio::test]
    async fn fetch_schools_refilters_when_upstream_ignores_search() {
        let (addr, captured) = school_server().await;
        let client = client_for(addr);

        let page = client.fetch_schools(1, 10, Some("jawa barat")).await.unwrap();

        assert_eq!(page.schools.len(), 2);
        assert!(page.schools.iter().all(|s| s.province == "Prov. Jawa Barat"));
        assert_eq!(page.total_data, 2, "total is recomputed from the filtered page");
        assert_eq!(
            captured.lock().unwrap()[0].get("search").map(String::as_str),
            Some("jawa barat")
        );
    }

    #[tokio::test]
    async fn blank_query_is_not_a_search() {
        let (addr, captured) = school_server().await;
        let client = client_for(addr);

        let page = client.fetch_schools(1, 10, Some("   ")).await.unwrap();

        assert_eq!(page.total_data, 250);
        assert!(!captured.lock().unwrap()[0].contains_key("search"));
    }

    #[tokio::test]
    async fn non_success_status_is_http_status_failure() {
        let router = Router::new().route(
            "/sekolah",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = client_for(serve(router).await);

        let err = client.fetch_schools(1, 10, None).await.unwrap_err();

        assert_eq!(err.endpoint, EndpointKind::Schools);
        assert_eq!(err.kind, FailureKind::HttpStatus(500));
        assert!(err.to_string().starts_with("schools request failed"));
    }

    #[tokio::test]
    async fn refused_connection_is_network_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(addr).fetch_news_sources().await.unwrap_err();

        assert_eq!(err.endpoint, EndpointKind::NewsCatalog);
        assert_eq!(err.kind, FailureKind::Network);
    }

    #[tokio::test]
    async fn malformed_body_is_decode_failure() {
        let router = Router::new().route("/", get(|| async { "<html>not json</html>" }));
        let client = client_for(serve(router).await);

        let err = client.fetch_news_sources().await.unwrap_err();

        assert_eq!(err.kind, FailureKind::Decode);
    }

    #[tokio::test]
    async fn fetch_news_addresses_source_and_category() {
        let router = Router::new().route(
            "/{source}/{category}",
            get(|Path((source, category)): Path<(String, String)>| async move {
                (
                    [("content-type", "application/json")],
                    format!(
                        r#"{{ "data": {{ "title": "{source}:{category}", "posts": [
                            {{ "title": "Satu", "link": "https://x/1", "pubDate": "2024-01-01T00:00:00Z", "description": "d" }}
                        ] }} }}"#
                    ),
                )
            }),
        );
        let client = client_for(serve(router).await);

        let payload = client.fetch_news("antara", "terbaru").await.unwrap();

        assert_eq!(payload.data.title.as_deref(), Some("antara:terbaru"));
        assert_eq!(payload.data.posts.len(), 1);
    }

    #[test]
    fn news_url_appends_segments_to_base() {
        let client = ApiClient::new(
            Url::parse("https://news.example/").unwrap(),
            Url::parse("https://news.example/api/").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();

        let url = client.news_url("cnn", "nasional").unwrap();
        assert_eq!(url.as_str(), "https://news.example/api/cnn/nasional");
    }
}
