// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Origin-bound HTTP client

use std::time::Instant;

use bytes::Bytes;
use reqwest::multipart::Form;
use reqwest::{Client, Method};

use super::request::{Origin, RestRequest};
use super::response::Response;
use crate::error::{Error, Result};

/// HTTP client bound to one (host, port, ssl) origin
///
/// Requests are prepared synchronously so that a malformed request fails at
/// dispatch; `execute` is the only await point.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    origin: Origin,
}

impl HttpClient {
    pub(crate) fn new(client: Client, origin: Origin) -> Self {
        Self { client, origin }
    }

    /// Origin this client is bound to
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Prepare a GET with the request's query parameters
    pub fn get(&self, request: &RestRequest) -> Result<reqwest::Request> {
        self.prepare(Method::GET, request, |builder| builder)
    }

    /// Prepare a POST with an opaque body
    pub fn post_body(&self, request: &RestRequest, body: Bytes) -> Result<reqwest::Request> {
        self.prepare(Method::POST, request, |builder| builder.body(body))
    }

    /// Prepare a multipart/form-data POST
    pub fn post_multipart(&self, request: &RestRequest, form: Form) -> Result<reqwest::Request> {
        self.prepare(Method::POST, request, |builder| builder.multipart(form))
    }

    fn prepare<F>(&self, method: Method, request: &RestRequest, body: F) -> Result<reqwest::Request>
    where
        F: FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    {
        if request.origin() != self.origin {
            return Err(Error::invalid_request(format!(
                "client for {} cannot send to {}",
                self.origin,
                request.origin()
            )));
        }

        let url = request.url()?;
        body(self.client.request(method, url))
            .build()
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    /// Send a prepared request and collect the full response
    pub async fn execute(&self, request: reqwest::Request) -> Result<Response> {
        let start = Instant::now();

        let response = self.client.execute(request).await?;

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        let response_time = start.elapsed().as_millis() as u64;

        Ok(Response::new(status, headers, body, final_url, response_time))
    }
}
