use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::ResourceStore;
use crate::graphql::{build_schema, AppSchema};
use crate::handlers;
use crate::services::MutationService;

/// Shared, immutable per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub schema: AppSchema,
    pub service: MutationService,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<dyn ResourceStore>) -> Self {
        let tokens = TokenService::from_config(&config.security);
        let service = MutationService::new(store, tokens, config.security.bcrypt_cost);
        let schema = build_schema(service.clone(), config.api.max_query_depth);
        Self { schema, service }
    }
}

pub fn app(config: &AppConfig, state: AppState) -> Router {
    let graphql = if config.api.enable_playground {
        get(handlers::graphiql).post(handlers::graphql_handler)
    } else {
        post(handlers::graphql_handler)
    };

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/graphql", graphql)
        .with_state(state)
        // Global middleware
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.is_development() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
