//! Vehicle rental backend server.

use std::{
    future::IntoFuture as _,
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, graphql, Args, Config};
use axum::{
    extract::MatchedPath,
    routing::{on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use common::SystemClock;
use futures::{future, TryFutureExt as _};
use http::{header, HeaderValue, Method};
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels of events written to stderr instead of stdout.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Most verbose level of emitted events, known once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(log_output(io::stdout, false))
        .with(log_output(io::stderr, true))
        .init();

    _ = run().await;
}

/// Creates a compact log output into the provided `writer`, accepting either
/// the [`STDERR_LEVELS`] events or all the others.
fn log_output<S, W>(
    writer: W,
    stderr_levels: bool,
) -> impl Layer<S> + Send + Sync + 'static
where
    S: log::Subscriber + for<'s> LookupSpan<'s>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span()
                || (STDERR_LEVELS.contains(meta.level()) == stderr_levels
                    && *meta.level() <= max)
        }))
}

/// Runs the server until it or any background task fails.
async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("set once"));

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| log::error!("failed to run database migrations: {e}"))?;

    let (service, background) =
        Service::new(service.into(), postgres, SystemClock);
    if background.is_empty() {
        log::info!("background tasks are disabled");
    }

    let cors = cors(&server.cors.origins).map_err(|e| log::error!("{e}"))?;
    let app = Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .layer(Extension(Arc::new(api::schema())))
        .layer(Extension(service))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|r: &http::Request<_>| request_span(r))
                .on_response(
                    |r: &http::Response<_>,
                     dur: time::Duration,
                     span: &log::Span| {
                        log_response(r, dur, span);
                    },
                ),
        );

    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind((server.host.as_str(), server.port))
        .await
        .map_err(|e| log::error!("failed to listen on `{addr}`: {e}"))?;
    log::info!("listening on `{addr}`");

    future::try_join(
        axum::serve(listener, app)
            .into_future()
            .map_err(|e| log::error!("webserver failed: {e}")),
        background
            .into_future()
            .map_err(|e| log::error!("background task failed: {e}")),
    )
    .await
    .map(drop)
}

/// Creates a [`CorsLayer`] allowing GraphQL requests from the provided
/// `origins`, where `*` allows any.
///
/// # Errors
///
/// If any of the `origins` is not a valid header value.
fn cors(origins: &[String]) -> Result<CorsLayer, String> {
    let allowed = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .map(|o| {
                    o.parse::<HeaderValue>().map_err(|e| {
                        format!("`{o}` is not a valid CORS origin: {e}")
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        )
    };
    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(allowed))
}

/// Creates the span of the provided HTTP request, leaving its status code to
/// be recorded by [`log_response()`].
fn request_span<B>(r: &http::Request<B>) -> log::Span {
    log::info_span!(
        "HTTP request",
        http.client_ip = InsecureClientIp::from(r.headers(), r.extensions())
            .map(|ip| ip.0.to_string())
            .ok(),
        http.flavor = ?r.version(),
        http.method = r.method().as_str(),
        http.route = r
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.target = r
            .uri()
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = r
            .headers()
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.status_code = log::field::Empty,
    )
}

/// Records the status code of the provided HTTP response into its `span`, and
/// logs the response duration, as an error for 4xx and 5xx statuses.
fn log_response<B>(
    r: &http::Response<B>,
    dur: time::Duration,
    span: &log::Span,
) {
    let status = r.status();
    _ = span.record("http.status_code", status.as_u16());

    let duration = format!("{}ms", dur.as_millis());
    if status.is_client_error() || status.is_server_error() {
        log::error!(duration = duration.as_str());
    } else {
        log::info!(duration = duration.as_str());
    }
}
