mod auth;
mod broadcast;
mod events;
mod registry;
mod shared;
mod users;
mod websockets;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use broadcast::EventBroadcaster;
use events::repository::InMemoryEventRepository;
// use events::repository::PostgresEventRepository; // For production
use events::service::EventService;
use registry::RoomRegistry;
use shared::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use users::repository::InMemoryUserRepository;
// use users::repository::PostgresUserRepository; // For production

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatherhub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GatherHub event server");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let event_repository = Arc::new(InMemoryEventRepository::new());

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    // let event_repository = Arc::new(PostgresEventRepository::new(pool));

    let registry = Arc::new(RoomRegistry::new());
    let broadcaster = Arc::new(EventBroadcaster::new(registry.clone()));
    let auth_service = Arc::new(auth::AuthService::new(user_repository.clone()));
    let event_service = Arc::new(EventService::new(event_repository, user_repository));

    let app_state = AppState::new(auth_service, event_service, registry, broadcaster);

    // Mutations require a valid bearer token; listing and watching do not
    let protected_routes = Router::new()
        .route("/api/events", post(events::create_event))
        .route(
            "/api/events/:id",
            axum::routing::put(events::update_event).delete(events::delete_event),
        )
        .route("/api/events/:id/join", post(events::join_event))
        .route("/api/events/:id/unjoin", post(events::unjoin_event))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::jwt_auth,
        ));

    let app = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/guest", post(auth::guest_login))
        .route("/api/events", get(events::list_events))
        .route("/ws", get(websockets::websocket_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:4000").await.unwrap();
    info!("Server running on http://localhost:4000");
    axum::serve(listener, app).await.unwrap();
}
