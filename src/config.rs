use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Shared secret expected in the `x-api-key` header. Empty disables
    /// the check (dev mode).
    pub webhook_secret: String,
    pub classifier_provider: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "carebook.db".to_string()),
            webhook_secret: env::var("WEBHOOK_SECRET").unwrap_or_default(),
            classifier_provider: env::var("CLASSIFIER_PROVIDER")
                .unwrap_or_else(|_| "lexicon".to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
        }
    }
}
