// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # restcall - Non-blocking REST calls
//!
//! A small facade that issues outbound REST calls and hands the raw response
//! to a completion handler without blocking the caller.
//!
//! ## Features
//!
//! - GET with ordered (and repeatable) query parameters
//! - Multipart upload of a single base64-encoded file, staged to a temp file
//! - Raw POST of text or bytes
//! - Clients reused per (host, port, ssl)
//! - Handlers run on a fixed worker pool with the caller's context installed
//!
//! ## Example
//!
//! ```rust,no_run
//! use restcall::{Context, RestRequest, RestService, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = RestService::new(ServiceConfig::default())?;
//!     let request = RestRequest::new("example.com", 443, true, "/ping").query("k", "1");
//!
//!     let (tx, rx) = tokio::sync::oneshot::channel();
//!     Context::new().with("tenant", "acme").sync_scope(|| {
//!         service.get(&request, move |response, context| {
//!             let _ = tx.send((response.map(|r| r.status_code()), context));
//!         })
//!     })?;
//!
//!     let (status, context) = rx.await?;
//!     println!("{:?} for tenant {:?}", status, context.tenant());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod pool;
pub mod service;
pub mod staging;

pub use config::{CleanupPolicy, MultipartStaging, ServiceConfig, TransportConfig};
pub use context::Context;
pub use error::{Error, Result};
pub use http::{
    Content, HttpClient, Origin, PostData, Response, ResponseResult, RestRequest, TransportFactory,
};
pub use pool::{ErrorSink, PoolStats, WorkerPool};
pub use service::RestService;
pub use staging::StagedFile;

/// restcall version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
