use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use carebook::config::AppConfig;
use carebook::db::{self, SqliteBookingStore, SqliteDirectory};
use carebook::services::classifier::gemini::GeminiClassifier;
use carebook::services::classifier::lexicon::LexiconClassifier;
use carebook::services::classifier::SpecialtyClassifier;
use carebook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = Arc::new(Mutex::new(db::init_db(&config.database_url)?));

    let classifier: Box<dyn SpecialtyClassifier> = match config.classifier_provider.as_str() {
        "gemini" => {
            anyhow::ensure!(
                !config.gemini_api_key.is_empty(),
                "GEMINI_API_KEY must be set when CLASSIFIER_PROVIDER=gemini"
            );
            tracing::info!("using Gemini classifier (model: {})", config.gemini_model);
            Box::new(GeminiClassifier::new(
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
            ))
        }
        _ => {
            tracing::info!("using lexicon classifier");
            Box::new(LexiconClassifier)
        }
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        directory: Box::new(SqliteDirectory::new(conn.clone())),
        store: Box::new(SqliteBookingStore::new(conn)),
        classifier,
    });

    let app = carebook::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
