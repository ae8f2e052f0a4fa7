// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Ambient call context
//!
//! Request-scoped values (identity, tenancy, transaction, ...) that follow a
//! call from the dispatching caller to its completion handler. The caller
//! installs a context with [`Context::scope`] or [`Context::sync_scope`];
//! the service captures [`Context::current`] at dispatch and reinstalls it
//! around the handler on the worker pool.

use std::collections::BTreeMap;
use std::future::Future;

tokio::task_local! {
    static CURRENT: Context;
}

/// Well-known context keys
pub mod keys {
    pub const IDENTITY: &str = "identity";
    pub const TENANT: &str = "tenant";
    pub const TRANSACTION: &str = "transaction";
}

/// Ordered set of string key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: BTreeMap<String, String>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn identity(&self) -> Option<&str> {
        self.get(keys::IDENTITY)
    }

    pub fn tenant(&self) -> Option<&str> {
        self.get(keys::TENANT)
    }

    pub fn transaction(&self) -> Option<&str> {
        self.get(keys::TRANSACTION)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Context installed on the current task or thread, or an empty one
    pub fn current() -> Self {
        CURRENT.try_with(|ctx| ctx.clone()).unwrap_or_default()
    }

    /// Run a future with this context installed
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }

    /// Run a closure with this context installed
    pub fn sync_scope<F, R>(self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT.sync_scope(self, f)
    }
}
