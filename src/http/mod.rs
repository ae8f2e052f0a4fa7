// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer for restcall
//!
//! Request and payload descriptions, the raw response handed to handlers,
//! and the transport factory that binds clients to an origin.

mod client;
mod post_data;
mod request;
mod response;
mod transport;

pub use client::HttpClient;
pub use post_data::{Content, PostData};
pub use request::{Origin, RestRequest};
pub use response::{Response, ResponseResult};
pub use transport::TransportFactory;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("restcall/", env!("CARGO_PKG_VERSION"));
