use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use lab_auth::application::auth_service::AuthService;
use lab_auth::infrastructure::config::Settings;
use lab_auth::infrastructure::logging::init_logging;
use lab_auth::presentation::auth::login;
use lab_auth::presentation::handlers::{AppState, health_check, json_config};
use lab_auth::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use tracing::{error, info, instrument};

fn cors(settings: &Settings) -> Cors {
    let cors = match &settings.cors_allowed_origin {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allow_any_origin(),
    };
    cors.allowed_methods(vec!["GET", "POST"])
        .allowed_header(header::CONTENT_TYPE)
        .max_age(3600)
}

#[tokio::main]
#[instrument]
async fn main() -> std::io::Result<()> {
    init_logging();
    info!("Logging initialized");

    let settings = Settings::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{e:#}"))
    })?;
    info!(?settings, "Configuration loaded");

    let state = web::Data::new(AppState {
        auth_service: AuthService::new(),
    });

    let cors_settings = settings.clone();
    let server = HttpServer::new(move || {
        tracing::trace!("Creating new application instance");
        App::new()
            .app_data(state.clone())
            .app_data(json_config())
            .wrap(cors(&cors_settings))
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health_check))
                    .route("/auth/login", web::post().to(login)),
            )
    });

    let bind_addr = settings.bind_address();
    info!(address = %bind_addr, "Binding server to address");
    let server = server.bind((settings.host.as_str(), settings.port))?;

    info!(
        address = %bind_addr,
        routes = %"GET /api/health, POST /api/auth/login",
        "Starting HTTP server"
    );
    server.run().await
}
