//! HTTP surface: the status report endpoint, a liveness probe, and the
//! response-completion observer that feeds the counter table.
//!
//! The report route answers GET and HEAD only; axum's method router rejects
//! anything else with an empty-body 405 before the handler runs. HEAD
//! responses carry the Content-Length a GET would have produced, with the
//! body stripped by the HTTP layer.

use crate::config::ReportConfig;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use counter::SharedCounterSegment;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

/// Build the application router.
///
/// The completion observer wraps every route, so reports, health checks,
/// and unmatched 404s are all tallied.
pub fn router(segment: Arc<SharedCounterSegment>, report: &ReportConfig) -> Router {
    let mut app = Router::new().route("/health", get(health_handler));

    if report.enabled {
        app = app.route(&report.path, get(report_handler));
    }

    app.fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(
            segment.clone(),
            observe_completion,
        ))
        .with_state(segment)
}

/// Bind with SO_REUSEPORT and serve until the listener fails.
///
/// Every worker process binds its own listener on the same address; the
/// kernel balances incoming connections across them.
pub async fn serve(address: SocketAddr, app: Router) -> io::Result<()> {
    let socket = match address {
        SocketAddr::V4(_) => tokio::net::TcpSocket::new_v4()?,
        SocketAddr::V6(_) => tokio::net::TcpSocket::new_v6()?,
    };
    socket.set_reuseport(true)?;
    socket.set_reuseaddr(true)?;
    socket.bind(address)?;
    let listener = socket.listen(1024)?;

    tracing::info!(%address, "worker listening");

    axum::serve(listener, app).await
}

/// Record the final status of every completed response.
///
/// One relaxed atomic add on the shared table; codes outside the tracked
/// range are dropped silently. Runs after the inner handler has produced
/// its response, whatever the outcome.
async fn observe_completion(
    State(segment): State<Arc<SharedCounterSegment>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    segment.record(response.status().as_u16());
    response
}

/// Render the status report.
///
/// Snapshots the table, sizes the response buffer from that same snapshot,
/// and emits the result as plain text with an exact Content-Length. A failed
/// buffer reservation becomes an empty-body 500; the table is never mutated
/// on this path.
async fn report_handler(State(segment): State<Arc<SharedCounterSegment>>) -> Response {
    let snapshot = segment.snapshot();

    match snapshot.render(std::process::id()) {
        Ok(body) => (StatusCode::OK, [("Content-Type", "text/plain")], body).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Liveness probe; doubles as a countable traffic source.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn not_found_handler() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
