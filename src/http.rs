// HTTP transport: a small blocking seam between the stages and the network.
// Stages only see `Transport`, so the whole run can be driven in memory.

use crate::error::{PosterError, Result};
use reqwest::blocking::{multipart, Client};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Raw response as the stages see it: status plus the full body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        HttpResponse {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx status into `RemoteService`, keeping a bit of the body.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let txt = String::from_utf8_lossy(&self.body);
        let snippet: String = txt.chars().take(200).collect();
        Err(PosterError::remote(
            self.url,
            format!("HTTP {} {}", self.status, snippet.trim()),
        ))
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// Blocking HTTP operations the run needs.
pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse>;

    /// POST an `application/x-www-form-urlencoded` body.
    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<HttpResponse>;

    /// POST a single file as `multipart/form-data` under `field`.
    fn post_file(&self, url: &str, field: &str, file_name: &str, bytes: Vec<u8>)
        -> Result<HttpResponse>;
}

/// Production transport backed by a reqwest blocking client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build the client. Without a timeout reqwest's own default applies.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PosterError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(ReqwestTransport { client })
    }

    fn finish(url: &str, res: reqwest::Result<reqwest::blocking::Response>) -> Result<HttpResponse> {
        let res = res.map_err(|e| PosterError::remote(url, e))?;
        let status = res.status().as_u16();
        let body = res.bytes().map_err(|e| PosterError::remote(url, e))?;
        debug!(url, status, len = body.len(), "response received");
        Ok(HttpResponse::new(url, status, body.to_vec()))
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse> {
        debug!(url, "GET");
        let res = self.client.get(url).query(query).send();
        Self::finish(url, res)
    }

    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<HttpResponse> {
        debug!(url, "POST form");
        let res = self.client.post(url).form(form).send();
        Self::finish(url, res)
    }

    fn post_file(
        &self,
        url: &str,
        field: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<HttpResponse> {
        debug!(url, field, size = bytes.len(), "POST multipart");
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part(field.to_string(), part);
        let res = self.client.post(url).multipart(form).send();
        Self::finish(url, res)
    }
}
