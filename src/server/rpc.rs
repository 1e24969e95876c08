//! The server instance handed to registration callbacks.
//!
//! An RPC service is a named group of methods. Mounting service `version.API`
//! with method route `/GetVersion` serves it at `/version.API/GetVersion`.

use axum::{
    body::{Body, HttpBody},
    extract::{DefaultBodyLimit, Request, State},
    http::{StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::server::options::TransportOptions;

/// Error body returned by the transport itself.
#[derive(Debug, Serialize)]
pub struct RpcStatus {
    pub code: &'static str,
    pub message: String,
}

/// Registration target for services.
#[derive(Debug, Default)]
pub struct RpcServer {
    router: Router,
    services: Vec<String>,
}

impl RpcServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a service's method routes under `/{name}`.
    ///
    /// A second service with the same name is ignored.
    pub fn add_service(&mut self, name: &str, methods: Router) -> &mut Self {
        let name = name.trim_matches('/');
        if name.is_empty() {
            tracing::warn!("Ignoring service with empty name");
            return self;
        }
        if self.has_service(name) {
            tracing::warn!(service = name, "Service already registered, ignoring duplicate");
            return self;
        }

        tracing::debug!(service = name, "Service registered");
        let router = std::mem::take(&mut self.router);
        self.router = router.nest(&format!("/{name}"), methods);
        self.services.push(name.to_string());
        self
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.iter().any(|s| s == name)
    }

    /// Registered service names, in registration order.
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Finish registration and wrap the services in the transport layers.
    pub fn into_router(self, options: &TransportOptions) -> Router {
        let mut router = self.router.fallback(unknown_method);

        if options.max_send_message_size > 0 {
            router = router.layer(middleware::from_fn_with_state(
                options.max_send_message_size,
                enforce_send_limit,
            ));
        }

        if options.max_recv_message_size > 0 {
            let limit = options.max_recv_message_size;
            router = router.layer(
                ServiceBuilder::new()
                    .layer(DefaultBodyLimit::max(limit))
                    .layer(RequestBodyLimitLayer::new(limit)),
            );
        }

        router.layer(TraceLayer::new_for_http())
    }
}

async fn unknown_method(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(RpcStatus {
            code: "unimplemented",
            message: format!("unknown method {}", uri.path()),
        }),
    )
}

/// Replace successful responses larger than `limit` bytes with an error.
async fn enforce_send_limit(State(limit): State<usize>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    let hint = response.body().size_hint();
    if hint.lower() > limit as u64 {
        return send_limit_exceeded(&path, hint.lower(), limit);
    }
    if hint.upper().is_some_and(|upper| upper <= limit as u64) {
        return response;
    }

    // Unknown length: buffer up to the limit.
    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => Response::from_parts(parts, Body::from(bytes)),
        Err(_) => send_limit_exceeded(&path, hint.lower(), limit),
    }
}

fn send_limit_exceeded(path: &str, size: u64, limit: usize) -> Response {
    tracing::warn!(path, size, limit, "Response exceeds max message size");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(RpcStatus {
            code: "resource_exhausted",
            message: format!("response larger than max message size ({limit} bytes)"),
        }),
    )
        .into_response()
}
