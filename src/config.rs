// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Service and transport configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::http::DEFAULT_USER_AGENT;

/// Default number of handler workers
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Transport configuration shared by every client the factory builds
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User agent string
    pub user_agent: String,
    /// Whole-request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,
    /// Connect timeout. `None` keeps the transport default.
    pub connect_timeout: Option<Duration>,
    /// Idle timeout for pooled connections
    pub pool_idle_timeout: Option<Duration>,
    /// Accept invalid certificates (dangerous!)
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            connect_timeout: None,
            pool_idle_timeout: None,
            accept_invalid_certs: false,
        }
    }
}

impl TransportConfig {
    /// Create a new transport config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set idle timeout for pooled connections
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Accept invalid TLS certificates
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Where the decoded bytes of a multipart upload live until dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultipartStaging {
    /// Write to `<temp_dir>/<uuid>` and stream the part from that file
    #[default]
    TempFile,
    /// Keep the bytes in memory; no file is created
    InMemory,
}

/// What happens when the staged temp file cannot be removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    /// Report to the error sink and skip the handler
    #[default]
    Strict,
    /// Invoke the handler, then report the failure to the error sink
    DeliverThenReport,
}

/// RestService configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Number of handler workers
    pub worker_threads: usize,
    /// Directory for staged uploads
    pub temp_dir: PathBuf,
    /// Multipart staging mode
    pub multipart_staging: MultipartStaging,
    /// Temp file cleanup failure policy
    pub cleanup_policy: CleanupPolicy,
    /// Transport settings
    pub transport: TransportConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            temp_dir: std::env::temp_dir(),
            multipart_staging: MultipartStaging::default(),
            cleanup_policy: CleanupPolicy::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a new service config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of handler workers (at least one)
    pub fn worker_threads(mut self, workers: usize) -> Self {
        self.worker_threads = workers.max(1);
        self
    }

    /// Set staging directory
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Set multipart staging mode
    pub fn multipart_staging(mut self, staging: MultipartStaging) -> Self {
        self.multipart_staging = staging;
        self
    }

    /// Set cleanup failure policy
    pub fn cleanup_policy(mut self, policy: CleanupPolicy) -> Self {
        self.cleanup_policy = policy;
        self
    }

    /// Set transport config
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}
