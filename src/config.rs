//! Pipeline configuration from the environment

use url::Url;

use crate::{
    error::{AppError, Result},
    storage::validate_identifier,
};

pub const DEFAULT_ACTIVITY_TABLE: &str = "activity_logs";
pub const DEFAULT_ANONYMOUS_LABEL: &str = "Anonymous";
pub const DEFAULT_SQLITE_URL: &str = "sqlite://activity.db";
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_NOTICE_CAPACITY: usize = 32;

/// Where activity entries are appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store, nothing leaves the process
    Memory,
    /// The hosted backend's REST endpoint
    Postgrest { url: Url, anon_key: String },
    /// A local SQLite database
    Sqlite { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub store: StoreBackend,
    pub activity_table: String,
    pub anonymous_label: String,
    pub queue_capacity: usize,
    pub notice_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            activity_table: DEFAULT_ACTIVITY_TABLE.to_string(),
            anonymous_label: DEFAULT_ANONYMOUS_LABEL.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            notice_capacity: DEFAULT_NOTICE_CAPACITY,
        }
    }
}

fn parse_capacity(key: &str, value: Option<String>, default: usize) -> Result<usize> {
    match value {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(0) | Err(_) => Err(AppError::configuration(format!(
                "{key} must be a positive integer, got {raw:?}"
            ))),
            Ok(capacity) => Ok(capacity),
        },
    }
}

impl PipelineConfig {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let store = match get("ACADEMY_STORE").as_deref().map(str::trim) {
            None | Some("memory") => StoreBackend::Memory,
            Some("postgrest") => {
                let raw_url = get("SUPABASE_URL")
                    .ok_or_else(|| AppError::configuration("SUPABASE_URL is required for the postgrest store"))?;
                let url = Url::parse(raw_url.trim())?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(AppError::configuration(format!(
                        "SUPABASE_URL must be http or https, got {}",
                        url.scheme()
                    )));
                }
                let anon_key = get("SUPABASE_ANON_KEY")
                    .ok_or_else(|| AppError::configuration("SUPABASE_ANON_KEY is required for the postgrest store"))?;
                StoreBackend::Postgrest { url, anon_key }
            }
            Some("sqlite") => StoreBackend::Sqlite {
                url: get("ACADEMY_SQLITE_URL").unwrap_or_else(|| DEFAULT_SQLITE_URL.to_string()),
            },
            Some(other) => {
                return Err(AppError::configuration(format!(
                    "ACADEMY_STORE must be memory, postgrest or sqlite, got {other:?}"
                )));
            }
        };

        let activity_table = get("ACADEMY_ACTIVITY_TABLE").unwrap_or_else(|| DEFAULT_ACTIVITY_TABLE.to_string());
        validate_identifier(&activity_table)
            .map_err(|_| AppError::configuration(format!("invalid ACADEMY_ACTIVITY_TABLE {activity_table:?}")))?;

        Ok(Self {
            store,
            activity_table,
            anonymous_label: get("ACADEMY_ANONYMOUS_LABEL").unwrap_or_else(|| DEFAULT_ANONYMOUS_LABEL.to_string()),
            queue_capacity: parse_capacity(
                "ACADEMY_QUEUE_CAPACITY",
                get("ACADEMY_QUEUE_CAPACITY"),
                DEFAULT_QUEUE_CAPACITY,
            )?,
            notice_capacity: parse_capacity(
                "ACADEMY_NOTICE_CAPACITY",
                get("ACADEMY_NOTICE_CAPACITY"),
                DEFAULT_NOTICE_CAPACITY,
            )?,
        })
    }
}
