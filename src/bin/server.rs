use std::net::SocketAddr;
use std::sync::Arc;

use apnifarm_server::{api, auth::TokenVerifier, config::Config, migrator};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use sea_orm::{Database, DatabaseConnection};

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    apnifarm_server::telemetry::init_telemetry("apnifarm-server");

    let config = Config::from_env().expect("Invalid configuration");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Database Connection
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    // Initialize Metrics
    apnifarm_server::metrics::init_metrics(&db).await;

    // The mock backend makes DatabaseConnection !Clone, so it is shared
    // behind an Arc rather than cloned per request.
    let db = Arc::new(db);
    let verifier = Arc::new(TokenVerifier::new(config.auth.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = app(db, verifier, &config, prometheus_layer, metric_handle);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn app(
    db: Arc<DatabaseConnection>,
    verifier: Arc<TokenVerifier>,
    config: &Config,
    prometheus_layer: axum_prometheus::PrometheusMetricLayer<'static>,
    metric_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Router {
    let protected_routes = Router::new()
        .route("/users/register", post(api::user::register))
        .route("/users/me", get(api::user::me))
        .route(
            "/assets",
            get(api::herd::list_animals).post(api::herd::create_animal),
        )
        .route(
            "/assets/:id",
            get(api::herd::get_animal).delete(api::herd::delete_animal),
        )
        .route("/milk", get(api::milk::list_milk).post(api::milk::record_milk))
        .route("/milk/stats", get(api::milk::milk_stats))
        .route(
            "/feeding",
            get(api::feeding::list_feeding).post(api::feeding::record_feeding),
        )
        .route_layer(axum::middleware::from_fn(api::middleware::require_auth));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(Extension(db))
        .layer(Extension(verifier))
        .layer(prometheus_layer)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let endpoint = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str().to_owned())
                        .unwrap_or_else(|| request.uri().path().to_owned());

                    let user_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .or_else(|| {
                            request
                                .headers()
                                .get("x-real-ip")
                                .and_then(|v| v.to_str().ok())
                        })
                        .unwrap_or("unknown");

                    // Fields left Empty are filled in by the handlers.
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        endpoint = %endpoint,
                        user_ip = user_ip,
                        farm_id = tracing::field::Empty,
                        animal_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(
                    config
                        .cors_origin
                        .parse::<axum::http::HeaderValue>()
                        .expect("Invalid CORS_ORIGIN"),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                ])
                .allow_credentials(true),
        )
        .route("/metrics", get(|| async move { metric_handle.render() }))
}
