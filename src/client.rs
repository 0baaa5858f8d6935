//! Thin JSON-over-HTTP client for the Kubernetes API

use crate::{config::Credentials, errors::ApplyError};
use http::{
    header::{HeaderName, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
    HeaderMap, HeaderValue, Method, Request, StatusCode, Uri,
};
use hyper::Body;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Status and parsed body of a response.
///
/// Empty bodies are represented as `Value::Null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub data: Value,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"statusCode\":{},\"data\":{}}}", self.status_code, self.data)
    }
}

/// Method, headers and body of a single request.
///
/// Headers set here are sent as is; `Authorization` is only added
/// by the client if it is missing.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    fn new(method: Method) -> Self {
        RequestOptions {
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn post<T: Serialize + ?Sized>(object: &T) -> Result<Self, ApplyError> {
        Self::new(Method::POST).json(object)
    }

    pub fn put<T: Serialize + ?Sized>(object: &T) -> Result<Self, ApplyError> {
        Self::new(Method::PUT).json(object)
    }

    /// Sets JSON body together with `Content-Type` and `Content-Length`.
    pub fn json<T: Serialize + ?Sized>(mut self, object: &T) -> Result<Self, ApplyError> {
        let body = serde_json::to_vec(object).map_err(ApplyError::Serialize)?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        self.body = Some(body);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Transport settings for `credentials`.
///
/// No authentication is configured here, the bearer header is added to each
/// request instead. Requests never time out.
fn kube_config(credentials: &Credentials) -> Result<kube::Config, ApplyError> {
    let invalid = || ApplyError::InvalidUrl(credentials.cluster_url.clone());
    let uri: Uri = credentials.cluster_url.parse().map_err(|_| invalid())?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(invalid());
    }
    let mut config = kube::Config::new(uri);
    config.root_cert = credentials.root_cert.clone();
    config.read_timeout = None;
    Ok(config)
}

/// Client bound to one cluster and one bearer token.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct ApplyClient {
    client: kube::Client,
    cluster_url: Uri,
    token: String,
}

impl fmt::Debug for ApplyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyClient")
            .field("cluster_url", &self.cluster_url)
            .finish_non_exhaustive()
    }
}

impl ApplyClient {
    /// Creates a client. Does not perform any requests.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cluster_url: &str, token: &str) -> Result<Self, ApplyError> {
        Self::from_credentials(&Credentials::new(cluster_url, token))
    }

    pub fn from_credentials(credentials: &Credentials) -> Result<Self, ApplyError> {
        let config = kube_config(credentials)?;
        let cluster_url = config.cluster_url.clone();
        let client = kube::Client::try_from(config).map_err(ApplyError::Connect)?;
        Ok(ApplyClient {
            client,
            cluster_url,
            token: credentials.token.clone(),
        })
    }

    pub fn cluster_url(&self) -> &Uri {
        &self.cluster_url
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApplyError> {
        self.request(path, RequestOptions::get()).await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        object: &T,
    ) -> Result<ApiResponse, ApplyError> {
        self.request(path, RequestOptions::post(object)?).await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        path: &str,
        object: &T,
    ) -> Result<ApiResponse, ApplyError> {
        self.request(path, RequestOptions::put(object)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApplyError> {
        self.request(path, RequestOptions::delete()).await
    }

    /// Performs exactly one round trip. Any status code is a success here.
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApplyError> {
        let RequestOptions {
            method,
            mut headers,
            body,
        } = options;
        if !headers.contains_key(AUTHORIZATION) {
            let bearer = HeaderValue::try_from(format!("Bearer {}", self.token))
                .map_err(http::Error::from)?;
            headers.insert(AUTHORIZATION, bearer);
        }

        let mut request = Request::builder()
            .method(method)
            .uri(path)
            .body(body.map_or_else(Body::empty, Body::from))?;
        *request.headers_mut() = headers;

        let response = self.client.send(request).await?;
        let status_code = response.status().as_u16();
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(kube::Error::HyperError)?;
        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(ApplyError::Parse)?
        };
        Ok(ApiResponse { status_code, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn json_body_sets_headers() {
        let opts = RequestOptions::post(&json!({"a": 1})).unwrap();
        assert_eq!(opts.method, Method::POST);
        assert_eq!(opts.headers[CONTENT_TYPE], "application/json");
        assert_eq!(opts.headers[CONTENT_LENGTH], "7");
        assert_eq!(opts.body.as_deref(), Some(&b"{\"a\":1}"[..]));
    }

    #[test]
    fn explicit_headers_win() {
        let opts = RequestOptions::put(&json!({}))
            .unwrap()
            .header(CONTENT_TYPE, HeaderValue::from_static("application/yaml"));
        assert_eq!(opts.headers[CONTENT_TYPE], "application/yaml");
        assert!(RequestOptions::get().body.is_none());
    }

    #[test]
    fn response_display_matches_json() {
        let response = ApiResponse {
            status_code: 201,
            data: json!({"kind": "Pod"}),
        };
        assert!(response.is_success());
        assert_eq!(
            serde_json::from_str::<Value>(&response.to_string()).unwrap(),
            serde_json::to_value(&response).unwrap()
        );
    }

    #[tokio::test]
    async fn rejects_relative_urls() {
        assert_matches!(
            ApplyClient::new("localhost", "t"),
            Err(ApplyError::InvalidUrl(url)) if url == "localhost"
        );
        assert_matches!(
            ApplyClient::new("not a url", "t"),
            Err(ApplyError::InvalidUrl(_))
        );
    }

    #[test]
    fn transport_config_trusts_cluster_ca() {
        let mut creds = Credentials::new("https://10.96.0.1:443", "sa-token");
        creds.root_cert = Some(vec![b"cluster-ca".to_vec()]);
        let config = kube_config(&creds).unwrap();
        assert_eq!(config.cluster_url.host(), Some("10.96.0.1"));
        assert_eq!(config.root_cert, Some(vec![b"cluster-ca".to_vec()]));
        assert_eq!(config.read_timeout, None);

        let plain = kube_config(&Credentials::new("http://127.0.0.1:8001", "t")).unwrap();
        assert_eq!(plain.root_cert, None);
        assert_eq!(plain.read_timeout, None);
    }

    #[tokio::test]
    async fn debug_hides_token() {
        let client = ApplyClient::new("https://10.0.0.1:6443", "secret-token").unwrap();
        let repr = format!("{:?}", client);
        assert!(!repr.contains("secret-token"));
        assert!(repr.contains("10.0.0.1"));
    }
}
