use axum::extract::{Query, State};
use axum::response::Html;
use chrono::Utc;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ServerError;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// Flash message carried back from `POST /upload`.
#[derive(Debug, Default, Deserialize)]
pub struct FlashParams {
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct EnvVar {
    key: &'static str,
    value: String,
}

/// `GET /` -- the demo landing page.
pub async fn index(
    State(state): State<AppState>,
    Query(flash): Query<FlashParams>,
) -> Result<Html<String>, ServerError> {
    let settings = &state.settings;
    let not_configured = || "Not configured".to_owned();

    let env_vars = vec![
        EnvVar {
            key: "AZURE_STORAGE_ACCOUNT",
            value: settings
                .storage_account
                .clone()
                .unwrap_or_else(not_configured),
        },
        EnvVar {
            key: "WEBSITE_SITE_NAME",
            value: settings.site.site_name.clone(),
        },
        EnvVar {
            key: "WEBSITE_RESOURCE_GROUP",
            value: settings.site.resource_group.clone(),
        },
        EnvVar {
            key: "WEBSITE_SKU",
            value: settings.site.sku.clone(),
        },
    ];

    let mut env = Environment::new();
    env.add_template("index.html", INDEX_TEMPLATE)?;
    let html = env.get_template("index.html")?.render(context! {
        storage_account => settings.storage_account,
        files_container => settings.files_container,
        pg_server => settings.postgres_server,
        pg_database => settings.postgres_database,
        app_version => env!("CARGO_PKG_VERSION"),
        timestamp => Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        env_vars => env_vars,
        message => flash.message,
        error => flash.error,
    })?;

    Ok(Html(html))
}
