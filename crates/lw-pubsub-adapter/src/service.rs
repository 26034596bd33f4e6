//! Pub/sub adapter service - HTTP intake plus the pull interface.
//!
//! The HTTP side serves `PUT /end-devices/{devAddr}`. Every other request is
//! still routed to the same handler so the parser decides between 404, 405
//! and 415 in a fixed order. Those structural checks run again in a gate in
//! front of the body limit, so an oversized body never masks them with 413.

use crate::adapters::handoff::{handoff_channel, AckHandle, Delivery, HandoffReceiver, HandoffSender};
use crate::domain::config::IntakeConfig;
use crate::domain::error::{AdapterError, ParseError, StructuralError};
use crate::middleware::{IntakeMetrics, MetricsSnapshot, RequestSpanLayer};
use crate::parser::{RawRequest, RegistrationParser};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use parking_lot::Mutex;
use shared_types::{DevAddr, Registration};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, info, info_span, Instrument, Span};

/// Registration intake with a pull interface for the routing layer.
///
/// ```ignore
/// let listener = TcpListener::bind("0.0.0.0:3021").await?;
/// let adapter = PubSubAdapter::new(listener, JsonRegistrationParser, Span::current())?;
///
/// loop {
///     let (registration, mut ack) = adapter.next_registration().await?;
///     router.subscribe(&registration)?;
///     ack.ack()?;
/// }
/// ```
pub struct PubSubAdapter {
    local_addr: SocketAddr,
    receiver: HandoffReceiver,
    metrics: Arc<IntakeMetrics>,
    shutdown_tx: watch::Sender<bool>,
    server: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
    span: Span,
}

impl PubSubAdapter {
    /// Start serving on an already-bound listener with default limits.
    ///
    /// Must be called from within a Tokio runtime. Log output of the intake
    /// is emitted inside `span`.
    pub fn new<P: RegistrationParser>(
        listener: TcpListener,
        parser: P,
        span: Span,
    ) -> Result<Self, AdapterError> {
        Self::with_config(listener, parser, span, IntakeConfig::default())
    }

    /// Start serving on an already-bound listener.
    ///
    /// `config.host`/`config.port` are ignored here; the listener decides.
    pub fn with_config<P: RegistrationParser>(
        listener: TcpListener,
        parser: P,
        span: Span,
        config: IntakeConfig,
    ) -> Result<Self, AdapterError> {
        config.validate()?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handoff, receiver) =
            handoff_channel(config.queue_capacity, config.ack_timeout, shutdown_rx.clone());
        let metrics = Arc::new(IntakeMetrics::new());

        let state = IntakeState {
            parser: Arc::new(parser),
            handoff,
            metrics: Arc::clone(&metrics),
        };
        let router = build_router(state, &config, span.clone());

        let mut server_shutdown = shutdown_rx;
        let server = tokio::spawn(
            async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = server_shutdown.wait_for(|stopped| *stopped).await;
                    })
                    .await
            }
            .instrument(span.clone()),
        );

        info!(parent: &span, addr = %local_addr, "Registration intake listening");

        Ok(Self {
            local_addr,
            receiver,
            metrics,
            shutdown_tx,
            server: Mutex::new(Some(server)),
            span,
        })
    }

    /// Bind `config.listen_addr()` and start serving.
    pub async fn bind<P: RegistrationParser>(
        config: IntakeConfig,
        parser: P,
    ) -> Result<Self, AdapterError> {
        config.validate()?;
        let listener = TcpListener::bind(config.listen_addr()).await?;
        let span = info_span!("pubsub_adapter", port = config.port);
        Self::with_config(listener, parser, span, config)
    }

    /// Wait for the next accepted registration.
    ///
    /// The returned [`AckHandle`] completes the suspended HTTP request. Only
    /// fails with [`AdapterError::Shutdown`].
    pub async fn next_registration(&self) -> Result<(Registration, AckHandle), AdapterError> {
        self.receiver.next().instrument(self.span.clone()).await
    }

    /// Stop the intake.
    ///
    /// Suspended requests are answered `503`, pending and later
    /// [`next_registration`](Self::next_registration) calls fail with
    /// [`AdapterError::Shutdown`]. Resolves once the HTTP server has
    /// stopped; calling it again is a no-op.
    pub async fn shutdown(&self) -> Result<(), AdapterError> {
        self.shutdown_tx.send_replace(true);

        let server = self.server.lock().take();
        if let Some(server) = server {
            info!(parent: &self.span, "Shutting down registration intake");
            server
                .await
                .map_err(|e| AdapterError::Server(e.to_string()))??;
            info!(parent: &self.span, "Registration intake stopped");
        }

        Ok(())
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Address the HTTP server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Drop for PubSubAdapter {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// State shared across request handlers
#[derive(Clone)]
struct IntakeState {
    parser: Arc<dyn RegistrationParser>,
    handoff: HandoffSender,
    metrics: Arc<IntakeMetrics>,
}

fn build_router(state: IntakeState, config: &IntakeConfig, span: Span) -> Router {
    Router::new()
        .fallback(handle_request)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(from_fn_with_state(state.clone(), structural_gate))
        .layer(RequestSpanLayer::new(span))
        .with_state(state)
}

/// Rejects wrong method, path or content type before the body is read.
async fn structural_gate(
    State(state): State<IntakeState>,
    request: Request,
    next: Next,
) -> Response {
    let checked = {
        let head = RawRequest {
            method: request.method().as_str(),
            path: request.uri().path(),
            content_type: request
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            body: &[],
        };
        state.parser.check_structure(&head)
    };

    match checked {
        Ok(()) => next.run(request).await,
        Err(e) => {
            state.metrics.record_request();
            reject(&state.metrics, e.into())
        }
    }
}

async fn handle_request(
    State(state): State<IntakeState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.metrics.record_request();

    let request = RawRequest {
        method: method.as_str(),
        path: uri.path(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        body: &body,
    };

    let registration = match state.parser.parse(&request) {
        Ok(registration) => registration,
        Err(e) => return reject(&state.metrics, e),
    };

    let dev_addr = registration.dev_addr;
    debug!(
        dev_addr = %dev_addr,
        app_id = %registration.recipient.id,
        "Registration accepted, waiting for consumer"
    );

    state.metrics.record_accepted();
    let mut pending = PendingGuard::new(&state.metrics);
    let delivery = state.handoff.submit(registration).await;
    pending.settle();

    respond(&state.metrics, dev_addr, delivery)
}

fn reject(metrics: &IntakeMetrics, error: ParseError) -> Response {
    let status = error.status();

    match error {
        ParseError::Structural(e) => {
            metrics.record_structural_rejection();
            debug!(error = %e, status = status.as_u16(), "Rejected request");

            let allow_put = matches!(e, StructuralError::MethodNotAllowed(_));
            let mut response = error_response(status, "structural", e.to_string(), None);
            if allow_put {
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static("PUT"));
            }
            response
        }
        ParseError::Validation(e) => {
            metrics.record_validation_rejection();
            debug!(
                error = %e,
                field = e.field().unwrap_or("-"),
                "Rejected registration"
            );
            error_response(status, "validation", e.to_string(), e.field())
        }
    }
}

fn respond(metrics: &IntakeMetrics, dev_addr: DevAddr, delivery: Delivery) -> Response {
    match delivery {
        Delivery::Acked => {
            metrics.record_acked();
            info!(dev_addr = %dev_addr, "Registration acknowledged");
            StatusCode::OK.into_response()
        }
        Delivery::Nacked(reason) => {
            metrics.record_nacked();
            info!(dev_addr = %dev_addr, reason = %reason, "Registration refused by consumer");
            error_response(reason.status(), reason.kind(), reason.to_string(), None)
        }
        Delivery::Shutdown => {
            metrics.record_aborted();
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "shutdown",
                "intake shutting down".into(),
                None,
            )
        }
        Delivery::Abandoned => {
            metrics.record_aborted();
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "abandoned",
                "registration dropped without acknowledgement".into(),
                None,
            )
        }
        Delivery::TimedOut => {
            metrics.record_aborted();
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                "consumer did not acknowledge in time".into(),
                None,
            )
        }
    }
}

fn error_response(
    status: StatusCode,
    kind: &str,
    message: String,
    field: Option<&str>,
) -> Response {
    let mut body = serde_json::json!({
        "error": kind,
        "message": message,
    });
    if let Some(field) = field {
        body["field"] = field.into();
    }
    (status, Json(body)).into_response()
}

/// Keeps the pending gauge honest when the client disconnects mid-handoff
/// and the handler future is dropped.
struct PendingGuard<'a> {
    metrics: &'a IntakeMetrics,
    settled: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(metrics: &'a IntakeMetrics) -> Self {
        Self {
            metrics,
            settled: false,
        }
    }

    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.metrics.record_aborted();
        }
    }
}
