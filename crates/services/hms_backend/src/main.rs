use hms_backend::app::{
    app_router, build_engine, connect_sql_store, spawn_sweeper, sweep_interval,
};
use hms_common::error::{Context, HmsError};
use hms_config::{load_config, AppConfig};
use hms_db::{BookingStore, MemoryBookingStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), HmsError> {
    let config = Arc::new(load_config().context("Failed to load config")?);
    // Flushes the file writer on exit
    let _log_guard = hms_common::logging::init_from_config(&config.logging);

    if config.database.is_some() {
        let store = connect_sql_store(&config).await?;
        serve(config, store).await
    } else {
        info!("No database configured, using the in-memory store");
        serve(config, MemoryBookingStore::new()).await
    }
}

async fn serve<S: BookingStore>(config: Arc<AppConfig>, store: S) -> Result<(), HmsError> {
    let engine = build_engine(&config, store).await?;

    if let Some(every) = sweep_interval(&config) {
        spawn_sweeper(engine.clone(), every);
    }

    #[allow(unused_mut)] // only mutated with the openapi feature
    let mut app = app_router(engine);

    #[cfg(feature = "openapi")]
    {
        use hms_booking::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Clinic Booking API",
                version = "0.1.0",
                description = "Slot publishing, reservation and reminder endpoints"
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server stopped")?;
    Ok(())
}
