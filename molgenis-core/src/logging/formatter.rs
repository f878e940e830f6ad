//! Log record formatting

use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// How log records are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line (production default)
    /// Example: {"timestamp":"2024-01-15T10:30:00.000Z","level":"INFO","target":"molgenis_core::bootstrap","message":"Bootstrapping finished"}
    Json,
    /// Example: 2024-01-15 10:30:00.000 INFO  [molgenis_core::bootstrap] Bootstrapping finished
    Human,
}

impl LogFormat {
    pub fn parse(format: &str) -> Option<Self> {
        match format {
            "json" => Some(Self::Json),
            "human" => Some(Self::Human),
            _ => None,
        }
    }

    pub fn format_record(&self, record: &log::Record) -> String {
        match self {
            LogFormat::Json => format_json(record),
            LogFormat::Human => format_human(record),
        }
    }
}

fn format_json(record: &log::Record) -> String {
    json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "level": record.level().as_str(),
        "target": record.target(),
        "message": record.args().to_string(),
    })
    .to_string()
}

fn format_human(record: &log::Record) -> String {
    format!(
        "{} {:5} [{}] {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level().as_str(),
        record.target(),
        record.args()
    )
}
