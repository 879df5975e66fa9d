use std::future::poll_fn;
use std::io::Read;

use flate2::read::MultiGzDecoder;
use hyper::client::HttpConnector;
use hyper::header::{CONTENT_ENCODING, LOCATION};
use hyper::service::Service;
use hyper::{body, Body, Client, Method, Request, Response, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use serde_json::Value;

use crate::constants;
use crate::error::{BoxError, FetchError, Result};

/// Redirect hops followed before the fetch gives up.
pub const MAX_REDIRECTS: usize = 20;

pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Fetch the full OWID COVID-19 dataset with a fresh HTTPS client.
pub async fn fetch_data() -> Result<Value> {
    DataFetcher::new().fetch_data().await
}

/// Issues the dataset request over any hyper-compatible service.
///
/// The service is cloned for every call, so concurrent fetches never share
/// connection state through the fetcher.
#[derive(Clone)]
pub struct DataFetcher<S = HttpsClient> {
    service: S,
}

impl DataFetcher {
    pub fn new() -> Self {
        Self::with_service(Client::builder().build::<_, Body>(HttpsConnector::new()))
    }
}

impl Default for DataFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> DataFetcher<S> {
    pub fn with_service(service: S) -> Self {
        Self { service }
    }
}

impl<S> DataFetcher<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone,
    S::Error: Into<BoxError>,
{
    /// GET the dataset and decode the body as JSON.
    ///
    /// Redirects carrying a `Location` are followed up to [`MAX_REDIRECTS`]
    /// hops. The final status code is not checked: any body that parses is
    /// returned.
    pub async fn fetch_data(&self) -> Result<Value> {
        let mut service = self.service.clone();
        let mut uri = constants::OWID_COVID_DATA_URI.clone();
        let mut redirects = 0;

        let response = loop {
            let request = Request::builder()
                .method(Method::GET)
                .uri(uri.clone())
                .body(Body::empty())
                .map_err(network)?;

            tracing::debug!(method = %request.method(), uri = %request.uri(), "requesting covid dataset");

            poll_fn(|cx| service.poll_ready(cx)).await.map_err(network)?;
            let response = service.call(request).await.map_err(network)?;

            tracing::debug!(status = %response.status(), "covid dataset response");

            let location = match redirect_target(&uri, &response)? {
                Some(location) => location,
                None => break response,
            };

            if redirects == MAX_REDIRECTS {
                return Err(network(format!(
                    "too many redirects ({MAX_REDIRECTS}) fetching {}",
                    constants::OWID_COVID_DATA_URL
                )));
            }
            redirects += 1;

            tracing::debug!(location = %location, redirects, "following redirect");
            uri = location;
        };

        let gzipped = response
            .headers()
            .get(CONTENT_ENCODING)
            .map_or(false, |encoding| encoding.as_bytes().eq_ignore_ascii_case(b"gzip"));

        let bytes = body::to_bytes(response.into_body()).await.map_err(network)?;

        tracing::debug!(bytes = bytes.len(), gzipped, "covid dataset body received");

        let data = if gzipped {
            let decoded = gunzip(&bytes).map_err(network)?;
            serde_json::from_slice(&decoded)?
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(data)
    }
}

fn network<E: Into<BoxError>>(err: E) -> FetchError {
    FetchError::Network(err.into())
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Where a redirect response points, resolved against the request URI.
/// A redirect status without `Location` is a final response.
fn redirect_target(current: &Uri, response: &Response<Body>) -> Result<Option<Uri>> {
    if !is_redirect(response.status()) {
        return Ok(None);
    }

    match response.headers().get(LOCATION) {
        Some(location) => {
            let location = location.to_str().map_err(network)?;
            resolve_location(current, location).map(Some)
        }
        None => Ok(None),
    }
}

fn resolve_location(base: &Uri, location: &str) -> Result<Uri> {
    if let Ok(target) = location.parse::<Uri>() {
        if target.scheme().is_some() {
            return Ok(target);
        }
    }

    let path_and_query = if location.starts_with('/') {
        location.to_string()
    } else {
        let dir = base.path().rsplit_once('/').map_or("", |(dir, _)| dir);
        format!("{dir}/{location}")
    };

    Uri::builder()
        .scheme(base.scheme_str().unwrap_or("https"))
        .authority(base.authority().map_or("", |authority| authority.as_str()))
        .path_and_query(path_and_query)
        .build()
        .map_err(network)
}

fn gunzip(encoded: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut gz = MultiGzDecoder::new(encoded);
    let mut decoded: Vec<u8> = vec!();
    gz.read_to_end(&mut decoded)?;
    Ok(decoded)
}
