// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Non-blocking REST calls with completion handlers
//!
//! Every operation validates and prepares its request on the caller's
//! thread, spawns the send on the transport runtime and returns. When the
//! transport completes, the handler runs on the worker pool with the
//! caller's [`Context`] installed.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use tokio::runtime::Handle;

use crate::config::{CleanupPolicy, MultipartStaging, ServiceConfig};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::http::{HttpClient, PostData, ResponseResult, RestRequest, TransportFactory};
use crate::pool::{ErrorSink, PoolStats, WorkerPool};
use crate::staging::StagedFile;

/// REST call facade
///
/// Completion handlers receive the response (or the transport error) and the
/// context captured at dispatch. Each handler is called at most once.
#[derive(Debug, Clone)]
pub struct RestService {
    runtime: Handle,
    transport: TransportFactory,
    pool: WorkerPool,
    config: Arc<ServiceConfig>,
}

impl RestService {
    /// Create a service on the current tokio runtime
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::config(format!("no tokio runtime available: {}", e)))?;
        Ok(Self::with_runtime(runtime, config))
    }

    /// Create a service on an explicit runtime
    pub fn with_runtime(runtime: Handle, config: ServiceConfig) -> Self {
        Self {
            runtime,
            transport: TransportFactory::new(config.transport.clone()),
            pool: WorkerPool::new(config.worker_threads),
            config: Arc::new(config),
        }
    }

    /// Replace the sink receiving errors raised on the worker pool
    pub fn with_error_sink(mut self, sink: ErrorSink) -> Self {
        self.pool = self.pool.with_error_sink(sink);
        self
    }

    /// Issue a GET with the request's query parameters
    pub fn get<H>(&self, request: &RestRequest, handler: H) -> Result<()>
    where
        H: FnOnce(ResponseResult, Context) + Send + 'static,
    {
        tracing::info!(operation = "GET", request = %request, "rest call");

        let client = self.transport.client_for(request)?;
        let prepared = client.get(request)?;
        self.dispatch(client, prepared, None, handler);
        Ok(())
    }

    /// Upload base64 content as a single multipart/form-data file part
    pub fn post_form<H>(&self, request: &RestRequest, post_data: &PostData, handler: H) -> Result<()>
    where
        H: FnOnce(ResponseResult, Context) + Send + 'static,
    {
        tracing::info!(operation = "POST_FORM", request = %request, "rest call");

        let client = self.transport.client_for(request)?;
        let decoded = post_data.content.decode_base64()?;

        match self.config.multipart_staging {
            MultipartStaging::TempFile => {
                let staged = StagedFile::create(&self.config.temp_dir, &decoded)?;
                let prepared = staged
                    .part()
                    .and_then(|part| form_request(&client, request, post_data, part));
                match prepared {
                    Ok(prepared) => self.dispatch(client, prepared, Some(staged), handler),
                    Err(err) => {
                        drop(staged);
                        return Err(err);
                    }
                }
            }
            MultipartStaging::InMemory => {
                let prepared = form_request(&client, request, post_data, Part::bytes(decoded))?;
                self.dispatch(client, prepared, None, handler);
            }
        }
        Ok(())
    }

    /// POST the content as an opaque body
    pub fn post_raw<H>(&self, request: &RestRequest, post_data: &PostData, handler: H) -> Result<()>
    where
        H: FnOnce(ResponseResult, Context) + Send + 'static,
    {
        tracing::info!(operation = "POST_RAW", request = %request, "rest call");

        let client = self.transport.client_for(request)?;
        let prepared = client.post_body(request, post_data.content.to_bytes())?;
        self.dispatch(client, prepared, None, handler);
        Ok(())
    }

    fn dispatch<H>(
        &self,
        client: HttpClient,
        prepared: reqwest::Request,
        staged: Option<StagedFile>,
        handler: H,
    ) where
        H: FnOnce(ResponseResult, Context) + Send + 'static,
    {
        let context = Context::current();
        let pool = self.pool.clone();
        let policy = self.config.cleanup_policy;

        self.runtime.spawn(async move {
            let outcome = client.execute(prepared).await;
            if let Err(ref err) = outcome {
                tracing::debug!(origin = %client.origin(), error = %err, "transport failed");
            }
            pool.run(move || complete(outcome, context, staged, policy, handler))
                .await;
        });
    }

    /// Get service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Get the transport factory
    pub fn transport(&self) -> &TransportFactory {
        &self.transport
    }

    /// Worker pool statistics
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

fn form_request(
    client: &HttpClient,
    request: &RestRequest,
    post_data: &PostData,
    part: Part,
) -> Result<reqwest::Request> {
    let part = part
        .file_name(post_data.filename.clone())
        .mime_str(&post_data.content_type)
        .map_err(|e| {
            Error::invalid_payload(format!(
                "content type '{}': {}",
                post_data.content_type, e
            ))
        })?;
    let form = Form::new().part(post_data.name.clone(), part);
    client.post_multipart(request, form)
}

/// Worker-side completion: remove the staged file, then hand over.
fn complete<H>(
    outcome: ResponseResult,
    context: Context,
    staged: Option<StagedFile>,
    policy: CleanupPolicy,
    handler: H,
) -> Result<()>
where
    H: FnOnce(ResponseResult, Context),
{
    let cleanup = match staged {
        Some(staged) => staged.remove(),
        None => Ok(()),
    };

    match policy {
        CleanupPolicy::Strict => {
            cleanup?;
            deliver(outcome, context, handler);
            Ok(())
        }
        CleanupPolicy::DeliverThenReport => {
            deliver(outcome, context, handler);
            cleanup
        }
    }
}

fn deliver<H>(outcome: ResponseResult, context: Context, handler: H)
where
    H: FnOnce(ResponseResult, Context),
{
    context
        .clone()
        .sync_scope(move || handler(outcome, context));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::keys;
    use crate::http::Response;
    use parking_lot::Mutex;
    use std::path::Path;
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_bytes, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WAIT: Duration = Duration::from_secs(10);

    fn request_for(server: &MockServer, endpoint: &str) -> RestRequest {
        let addr = server.address();
        RestRequest::new(addr.ip().to_string(), addr.port(), false, endpoint)
    }

    fn channel_handler() -> (
        impl FnOnce(ResponseResult, Context) + Send + 'static,
        mpsc::UnboundedReceiver<(ResponseResult, Context, Context)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = move |outcome: ResponseResult, context: Context| {
            let _ = tx.send((outcome, context, Context::current()));
        };
        (handler, rx)
    }

    async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for completion")
            .expect("channel closed")
    }

    fn ok(outcome: ResponseResult) -> Response {
        outcome.expect("transport error")
    }

    fn staged_files(dir: &Path) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    async fn wait_for_request(server: &MockServer) {
        let deadline = Instant::now() + WAIT;
        while server.received_requests().await.unwrap_or_default().is_empty() {
            assert!(Instant::now() < deadline, "request never reached the server");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn unreachable_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn capturing_sink() -> (ErrorSink, mpsc::UnboundedReceiver<Error>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink: ErrorSink = Arc::new(move |err: Error| {
            let _ = tx.send(err);
        });
        (sink, rx)
    }

    fn service(dir: &Path) -> RestService {
        RestService::new(ServiceConfig::new().temp_dir(dir)).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_delivers_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(query_param("k", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let req = request_for(&server, "/ping").query("k", "1").query("k", "2");
        let (handler, mut rx) = channel_handler();

        service(dir.path()).get(&req, handler).unwrap();

        let (outcome, _, _) = next(&mut rx).await;
        let response = ok(outcome);
        assert_eq!(response.status_code(), 200);
        assert_eq!(&response.body[..], b"pong");

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].url.query(), Some("k=1&k=2"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_query_params_keep_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let req = request_for(&server, "/search").queries([("a", "1"), ("b", "2"), ("a", "3")]);
        let (handler, mut rx) = channel_handler();

        service(dir.path()).get(&req, handler).unwrap();
        assert_eq!(ok(next(&mut rx).await.0).status_code(), 204);

        let received = server.received_requests().await.unwrap();
        assert!(received[0].url.as_str().ends_with("/search?a=1&b=2&a=3"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/echo"))
            .and(header("content-length", "5"))
            .and(body_bytes(b"hello".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (handler, mut rx) = channel_handler();

        service(dir.path())
            .post_raw(&request_for(&server, "/v1/echo"), &PostData::text("hello"), handler)
            .unwrap();

        assert_eq!(ok(next(&mut rx).await.0).status_code(), 200);
        assert!(staged_files(dir.path()).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_raw_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-length", "3"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (handler, mut rx) = channel_handler();

        service(dir.path())
            .post_raw(
                &request_for(&server, "/blob"),
                &PostData::bytes(vec![0x00, 0xFF, 0x10]),
                handler,
            )
            .unwrap();

        assert_eq!(ok(next(&mut rx).await.0).status_code(), 200);
        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].body, vec![0x00, 0xFF, 0x10]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_form_stages_and_cleans_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(300)))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let data = PostData::file("file", "report.pdf", "application/pdf", "SGVsbG8=");
        let (handler, mut rx) = channel_handler();

        service(dir.path())
            .post_form(&request_for(&server, "/upload"), &data, handler)
            .unwrap();

        let staged = staged_files(dir.path());
        assert_eq!(staged.len(), 1);
        assert_eq!(std::fs::read(&staged[0]).unwrap(), b"Hello");

        assert_eq!(ok(next(&mut rx).await.0).status_code(), 201);
        assert!(!staged[0].exists());

        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body).to_lowercase();
        assert!(body.contains(r#"content-disposition: form-data; name="file"; filename="report.pdf""#));
        assert!(body.contains("content-type: application/pdf"));
        assert!(body.contains("\r\n\r\nhello\r\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_form_in_memory_touches_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let service = RestService::new(
            ServiceConfig::new()
                .temp_dir(dir.path())
                .multipart_staging(MultipartStaging::InMemory),
        )
        .unwrap();
        let data = PostData::file("file", "a.bin", "application/octet-stream", "AAEC");
        let (handler, mut rx) = channel_handler();

        service
            .post_form(&request_for(&server, "/upload"), &data, handler)
            .unwrap();
        assert!(staged_files(dir.path()).is_empty());

        assert_eq!(ok(next(&mut rx).await.0).status_code(), 200);
        let received = server.received_requests().await.unwrap();
        let body = &received[0].body;
        assert!(body.windows(3).any(|w| w == [0x00, 0x01, 0x02]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_transport_failure_reaches_handler() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let req = RestRequest::new("127.0.0.1", unreachable_port(), false, "/ping");

        let (handler, mut rx) = channel_handler();
        service.get(&req, handler).unwrap();
        let err = next(&mut rx).await.0.unwrap_err();
        assert!(err.is_transport());

        let (handler, mut rx) = channel_handler();
        let data = PostData::file("file", "report.pdf", "application/pdf", "SGVsbG8=");
        service.post_form(&req, &data, handler).unwrap();
        assert!(next(&mut rx).await.0.unwrap_err().is_transport());
        assert!(staged_files(dir.path()).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_context_follows_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let req = request_for(&server, "/whoami");
        let ctx = Context::new()
            .with(keys::IDENTITY, "alice")
            .with(keys::TENANT, "acme");
        let (handler, mut rx) = channel_handler();

        ctx.clone()
            .sync_scope(|| service.get(&req, handler))
            .unwrap();

        let (outcome, passed, installed) = next(&mut rx).await;
        ok(outcome);
        assert_eq!(passed, ctx);
        assert_eq!(installed, ctx);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_context_follows_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let req = request_for(&server, "/upload");
        let data = PostData::file("file", "report.pdf", "application/pdf", "SGVsbG8=");
        let ctx = Context::new()
            .with(keys::TENANT, "acme")
            .with(keys::TRANSACTION, "tx-7");
        let (handler, mut rx) = channel_handler();

        ctx.clone()
            .scope(async { service.post_form(&req, &data, handler) })
            .await
            .unwrap();

        let (outcome, passed, installed) = next(&mut rx).await;
        assert_eq!(ok(outcome).status_code(), 201);
        assert_eq!(passed, ctx);
        assert_eq!(installed, ctx);
        assert!(staged_files(dir.path()).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dispatch_does_not_wait_for_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (handler, mut rx) = channel_handler();

        let start = Instant::now();
        service(dir.path())
            .get(&request_for(&server, "/slow"), handler)
            .unwrap();
        assert!(start.elapsed() < Duration::from_millis(1000));

        ok(next(&mut rx).await.0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_requests_fail_at_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let called = Arc::new(Mutex::new(0));

        for req in [
            RestRequest::new("", 80, false, "/x"),
            RestRequest::new("h.test", 0, false, "/x"),
            RestRequest::new("h.test", 80, false, "x"),
        ] {
            let counter = Arc::clone(&called);
            let err = service
                .get(&req, move |_, _| *counter.lock() += 1)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*called.lock(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_payloads_fail_at_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let req = RestRequest::new("127.0.0.1", 9, false, "/upload");

        let bad_base64 = PostData::file("file", "x", "text/plain", "%%%");
        let err = service.post_form(&req, &bad_base64, |_, _| {}).unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));

        let bytes = PostData::bytes(b"raw".to_vec());
        let err = service.post_form(&req, &bytes, |_, _| {}).unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));

        let bad_mime = PostData::file("file", "x", "not a mime", "SGVsbG8=");
        let err = service.post_form(&req, &bad_mime, |_, _| {}).unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));

        assert!(staged_files(dir.path()).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_staging_failure_fails_at_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir.path().join("missing"));
        let req = RestRequest::new("127.0.0.1", 9, false, "/upload");
        let data = PostData::file("file", "x", "text/plain", "SGVsbG8=");

        let err = service.post_form(&req, &data, |_, _| {}).unwrap_err();
        assert!(matches!(err, Error::Staging { .. }));
    }

    struct VanishingUpload {
        rx: mpsc::UnboundedReceiver<(ResponseResult, Context, Context)>,
        errors: mpsc::UnboundedReceiver<Error>,
        _server: MockServer,
        _dir: tempfile::TempDir,
    }

    /// Upload whose staged file is deleted behind the service's back while
    /// the response is still pending.
    async fn form_with_vanishing_file(policy: CleanupPolicy) -> VanishingUpload {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (sink, errors) = capturing_sink();
        let service = RestService::new(
            ServiceConfig::new()
                .temp_dir(dir.path())
                .cleanup_policy(policy),
        )
        .unwrap()
        .with_error_sink(sink);
        let data = PostData::file("file", "report.pdf", "application/pdf", "SGVsbG8=");
        let (handler, rx) = channel_handler();

        service
            .post_form(&request_for(&server, "/upload"), &data, handler)
            .unwrap();

        wait_for_request(&server).await;
        for file in staged_files(dir.path()) {
            std::fs::remove_file(file).unwrap();
        }
        VanishingUpload {
            rx,
            errors,
            _server: server,
            _dir: dir,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_strict_cleanup_failure_skips_handler() {
        let mut upload = form_with_vanishing_file(CleanupPolicy::Strict).await;

        let err = next(&mut upload.errors).await;
        assert!(err.is_cleanup());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(upload.rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_lenient_cleanup_failure_still_delivers() {
        let mut upload = form_with_vanishing_file(CleanupPolicy::DeliverThenReport).await;

        assert_eq!(ok(next(&mut upload.rx).await.0).status_code(), 200);
        assert!(next(&mut upload.errors).await.is_cleanup());
    }

    #[test]
    fn test_runtime_shutdown_removes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        // Accepts connections via the backlog but never answers.
        let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = silent.local_addr().unwrap().port();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let service = RestService::with_runtime(
            runtime.handle().clone(),
            ServiceConfig::new().temp_dir(dir.path()),
        );
        let req = RestRequest::new("127.0.0.1", port, false, "/upload");
        let data = PostData::file("file", "report.pdf", "application/pdf", "SGVsbG8=");

        let guard = runtime.enter();
        service.post_form(&req, &data, |_, _| {}).unwrap();
        assert_eq!(staged_files(dir.path()).len(), 1);
        drop(guard);

        std::thread::sleep(Duration::from_millis(100));
        runtime.shutdown_timeout(Duration::from_millis(200));
        assert!(staged_files(dir.path()).is_empty());
        drop(silent);
    }

    #[test]
    fn test_new_requires_runtime() {
        let err = RestService::new(ServiceConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_with_runtime_from_plain_thread() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let service = RestService::with_runtime(runtime.handle().clone(), ServiceConfig::default());
        let req = RestRequest::new("127.0.0.1", unreachable_port(), false, "/");
        let (tx, rx) = std::sync::mpsc::channel();

        service
            .get(&req, move |outcome, _| {
                let _ = tx.send(outcome.is_err());
            })
            .unwrap();

        assert!(rx.recv_timeout(WAIT).unwrap());
        assert_eq!(service.pool_stats().submitted, 1);
    }
}
