// ./api/src/main.rs
use axum::{
    Json,
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
    routing::{get, post},
};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use application::{
    // Services
    ContactService,
    DiagnosticsService,
    ProjectService,
    // DTOs / Requests / Responses
    ApplicationError,
    CONTACT_ACK,
    DocumentStore,
    MessageResponse,
    ProjectsQuery,
    ProjectsResponse,
};
// Import domain types used directly in API (the contact request body)
use domain::Message;
// Import infrastructure layer implementations
use infrastructure::{DATABASE_NAME_VAR, DATABASE_URL_VAR};

/// Shared application state handed to every handler.
#[derive(Clone)]
struct AppState {
    project_service: Arc<ProjectService>,
    contact_service: Arc<ContactService>,
    diagnostics_service: Arc<DiagnosticsService>,
}

const DEFAULT_PORT: u16 = 8000;

// Application entry point
#[tokio::main]
async fn main() {
    // Load a .env file when present; real environment variables win.
    dotenvy::dotenv().ok();

    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let port = match env::var("PORT") {
        Ok(port_str) => match u16::from_str(&port_str) {
            Ok(port_num) => {
                info!("Using port {} from environment variable PORT.", port_num);
                port_num
            }
            Err(_) => {
                warn!(
                    "Invalid PORT value '{}' in environment variable. Using default port {}.",
                    port_str, DEFAULT_PORT
                );
                DEFAULT_PORT
            }
        },
        Err(_) => {
            info!(
                "PORT environment variable not set. Using default port {}.",
                DEFAULT_PORT
            );
            DEFAULT_PORT
        }
    };

    // --- Dependency Injection ---
    // The storage adapter is optional: without it every service runs in
    // fallback mode. The env flags are captured for the diagnostics report.
    let database_url_set = env::var(DATABASE_URL_VAR).is_ok();
    let database_name_set = env::var(DATABASE_NAME_VAR).is_ok();
    let store = infrastructure::connect_from_env()
        .await
        .map(|store| Arc::new(store) as Arc<dyn DocumentStore>);

    let app_state = AppState {
        project_service: Arc::new(ProjectService::new(store.clone())),
        contact_service: Arc::new(ContactService::new(store.clone())),
        diagnostics_service: Arc::new(DiagnosticsService::new(
            store,
            database_url_set,
            database_name_set,
        )),
    };
    info!("Application services initialized.");

    let app = build_router(app_state);
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server starting on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Builds the application router. Split out so tests can drive it directly.
fn build_router(state: AppState) -> Router {
    // Cross-origin requests are unconditionally permitted, with credentials.
    // Wildcard values cannot be combined with credentials, so the policy
    // mirrors whatever the request asks for.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/", get(root_handler))
        .route("/api/projects", get(list_projects_handler))
        .route("/api/contact", post(contact_handler))
        .route("/test", get(diagnostics_handler))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

// --- API Handlers ---

/// Handler for the static acknowledgment payload (GET /).
async fn root_handler() -> impl IntoResponse {
    JsonResponse(MessageResponse {
        message: "Portfolio backend running".to_string(),
    })
}

/// Handler for listing projects (GET /api/projects?limit=N).
async fn list_projects_handler(
    State(state): State<AppState>,
    Query(query): Query<ProjectsQuery>,
) -> Response {
    info!(limit = query.limit, "Received request to list projects");
    match state.project_service.list_projects(query.limit).await {
        Ok(projects) => {
            (StatusCode::OK, JsonResponse(ProjectsResponse { projects })).into_response()
        }
        Err(e) => {
            error!("Failed to list projects via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for contact submissions (POST /api/contact).
async fn contact_handler(State(state): State<AppState>, Json(payload): Json<Message>) -> Response {
    info!(sender = %payload.email, "Received contact submission");
    match state.contact_service.submit(payload).await {
        Ok(()) => (
            StatusCode::OK,
            JsonResponse(MessageResponse {
                message: CONTACT_ACK.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to store contact submission via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for the diagnostics report (GET /test).
async fn diagnostics_handler(State(state): State<AppState>) -> Response {
    info!("Received request for diagnostics");
    let report = state.diagnostics_service.report().await;
    (StatusCode::OK, JsonResponse(report)).into_response()
}

/// Helper function to map ApplicationError to an HTTP response.
/// Raw storage details stay in the logs; clients get a generic message.
fn map_application_error_to_response(err: ApplicationError) -> Response {
    let (status, detail) = match err {
        ApplicationError::Storage(detail) => {
            error!("Underlying storage error: {}", detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal storage error occurred".to_string(),
            )
        }
    };
    (status, JsonResponse(serde_json::json!({ "detail": detail }))).into_response()
}
