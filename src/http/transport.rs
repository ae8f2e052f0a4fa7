// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport factory
//!
//! Builds origin-bound clients from the shared transport. One underlying
//! `reqwest::Client` (and its connection pool) is kept per origin.

use std::sync::Arc;

use dashmap::DashMap;
use reqwest::Client;

use super::client::HttpClient;
use super::request::{Origin, RestRequest};
use crate::config::TransportConfig;
use crate::error::{Error, Result};

/// Builds and caches clients per (host, port, ssl)
#[derive(Debug, Clone)]
pub struct TransportFactory {
    config: TransportConfig,
    clients: Arc<DashMap<Origin, Client>>,
}

impl TransportFactory {
    /// Create a new factory
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            clients: Arc::new(DashMap::new()),
        }
    }

    /// Client bound to the request's origin
    pub fn client_for(&self, request: &RestRequest) -> Result<HttpClient> {
        request.validate()?;
        let origin = request.origin();

        if let Some(client) = self.clients.get(&origin) {
            return Ok(HttpClient::new(client.clone(), origin));
        }

        let client = self.build_client(&origin)?;
        // A concurrent caller may have won the race; keep whichever landed first.
        let client = self
            .clients
            .entry(origin.clone())
            .or_insert(client)
            .clone();

        tracing::debug!(origin = %origin, "transport client created");
        Ok(HttpClient::new(client, origin))
    }

    fn build_client(&self, origin: &Origin) -> Result<Client> {
        let mut builder = Client::builder()
            .user_agent(&self.config.user_agent)
            .danger_accept_invalid_certs(self.config.accept_invalid_certs)
            .https_only(origin.ssl);

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.config.pool_idle_timeout {
            builder = builder.pool_idle_timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| Error::config(format!("failed to build client for {}: {}", origin, e)))
    }

    /// Number of origins with a live client
    pub fn cached_clients(&self) -> usize {
        self.clients.len()
    }

    /// Drop the client for one origin, closing its idle connections
    pub fn evict(&self, origin: &Origin) -> bool {
        self.clients.remove(origin).is_some()
    }

    /// Drop every cached client
    pub fn clear(&self) {
        self.clients.clear();
    }

    /// Get transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Default for TransportFactory {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_cached_per_origin() {
        let factory = TransportFactory::default();
        let a = RestRequest::new("a.test", 80, false, "/one");
        let a2 = RestRequest::new("a.test", 80, false, "/two");
        let a_tls = RestRequest::new("a.test", 80, true, "/one");

        factory.client_for(&a).unwrap();
        factory.client_for(&a2).unwrap();
        assert_eq!(factory.cached_clients(), 1);

        let client = factory.client_for(&a_tls).unwrap();
        assert!(client.origin().ssl);
        assert_eq!(factory.cached_clients(), 2);

        assert!(factory.evict(&a.origin()));
        assert!(!factory.evict(&a.origin()));
        factory.clear();
        assert_eq!(factory.cached_clients(), 0);
    }

    #[test]
    fn test_invalid_request_builds_nothing() {
        let factory = TransportFactory::default();
        let err = factory
            .client_for(&RestRequest::new("", 80, false, "/"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(factory.cached_clients(), 0);
    }
}
