// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Outbound request description

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::{Error, Result};

/// One outbound REST call: target origin, endpoint path and query parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestRequest {
    /// Target host (DNS name or literal address)
    pub host: String,
    /// Target port
    pub port: u16,
    /// Use HTTPS
    #[serde(default)]
    pub ssl: bool,
    /// Endpoint path, starting with `/`
    pub endpoint: String,
    /// Query parameters in wire order; duplicate names are kept
    #[serde(default)]
    pub query_params: Vec<(String, String)>,
}

/// Key identifying the origin a client is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub host: String,
    pub port: u16,
    pub ssl: bool,
}

impl RestRequest {
    /// Create a new request without query parameters
    pub fn new(
        host: impl Into<String>,
        port: u16,
        ssl: bool,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            ssl,
            endpoint: endpoint.into(),
            query_params: Vec::new(),
        }
    }

    /// Append a query parameter
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    /// Append several query parameters, keeping their order
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set TLS
    pub fn ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    /// URL scheme for this request
    pub fn scheme(&self) -> &'static str {
        if self.ssl {
            "https"
        } else {
            "http"
        }
    }

    /// Check host, port and endpoint
    pub fn validate(&self) -> Result<()> {
        self.parsed_host()?;
        if self.port == 0 {
            return Err(Error::invalid_request("port must be in 1..=65535"));
        }
        if !self.endpoint.starts_with('/') {
            return Err(Error::invalid_request(format!(
                "endpoint '{}' must start with '/'",
                self.endpoint
            )));
        }
        Ok(())
    }

    /// Host as a single URL host component.
    ///
    /// Anything that would spill into userinfo, port, path, query or
    /// fragment is rejected.
    fn parsed_host(&self) -> Result<Host> {
        if self.host.trim().is_empty() {
            return Err(Error::invalid_request("host is empty"));
        }
        Host::parse(&bracketed(&self.host))
            .map_err(|e| Error::invalid_request(format!("host '{}': {}", self.host, e)))
    }

    /// Base URL of the origin, without path or query
    pub fn base_url(&self) -> Result<Url> {
        self.validate()?;
        let host = self.parsed_host()?;
        let url = Url::parse(&format!("{}://{}:{}/", self.scheme(), host, self.port))
            .map_err(|e| Error::invalid_request(format!("host '{}': {}", self.host, e)))?;
        if !url.host().map_or(false, |parsed| parsed == host) {
            return Err(Error::invalid_request(format!(
                "host '{}' does not form a valid origin",
                self.host
            )));
        }
        Ok(url)
    }

    /// Full URL with endpoint and query parameters in order
    pub fn url(&self) -> Result<Url> {
        let mut url = self.base_url()?;
        url.set_path(&self.endpoint);
        if !self.query_params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query_params.iter().map(|(k, v)| (k, v)));
        }
        Ok(url)
    }

    /// Origin key for client reuse
    pub fn origin(&self) -> Origin {
        Origin {
            host: self.host.clone(),
            port: self.port,
            ssl: self.ssl,
        }
    }
}

/// IPv6 literals are written in brackets inside URLs
fn bracketed(host: &str) -> Cow<'_, str> {
    if host.contains(':') && !host.starts_with('[') {
        Cow::Owned(format!("[{}]", host))
    } else {
        Cow::Borrowed(host)
    }
}

impl fmt::Display for RestRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} ssl={} {} ({} query params)",
            self.host,
            self.port,
            self.ssl,
            self.endpoint,
            self.query_params.len()
        )
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.ssl { "https" } else { "http" };
        write!(f, "{}://{}:{}", scheme, bracketed(&self.host), self.port)
    }
}
