//! # LitReview Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod settings;

use actix_web::{web, App, HttpServer};
use lr_api::{configure_routes, middleware, AppState};

use crate::settings::Settings;

// Feature-gated imports: plugins are compiled to order
#[cfg(feature = "db-sqlite")]
use lr_db_sqlite::SqlitePostStore;

#[cfg(feature = "storage-local")]
use lr_storage_local::LocalMediaStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let store = SqlitePostStore::new(&settings.database_url).await?;

    // 2. Initialize Storage Implementation
    #[cfg(feature = "storage-local")]
    let media = LocalMediaStore::new(
        settings.media_root.clone().into(),
        settings.media_url_prefix.clone(),
    );
    tokio::fs::create_dir_all(&settings.media_root).await?;

    // 3. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let state = web::Data::new(AppState {
        store: Box::new(store),
        media: Box::new(media),
        max_upload_bytes: settings.max_upload_bytes,
    });

    log::info!("LitReview starting on http://{}:{}", settings.host, settings.port);

    let media_root = settings.media_root.clone();
    let media_prefix = settings.media_url_prefix.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy())
            .wrap(middleware::security_headers())
            .service(actix_files::Files::new(&media_prefix, &media_root))
            .configure(configure_routes)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await?;

    Ok(())
}
