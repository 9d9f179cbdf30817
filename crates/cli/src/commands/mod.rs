pub mod advance;
pub mod build;
pub mod check;
pub mod config;
pub mod decompose;
pub mod routes;

use procura_core::config::{AppConfig, LoadOptions};
use procura_core::errors::InterfaceError;
use procura_db::DirectoryFixture;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Reports an application failure with its user-safe summary and detail.
    pub fn from_interface(command: &str, error: InterfaceError) -> Self {
        let (error_class, exit_code) = match &error {
            InterfaceError::Forbidden { .. } => ("forbidden", 1),
            InterfaceError::BadRequest { .. } => ("bad_request", 5),
            InterfaceError::DataInconsistency { .. } => ("data_inconsistency", 7),
            InterfaceError::ServiceUnavailable { .. } => ("service_unavailable", 8),
            InterfaceError::Internal { .. } => ("internal", 9),
        };
        Self::failure(
            command,
            error_class,
            format!("{} ({error})", error.user_message()),
            exit_code,
        )
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn load_fixture(
    command: &str,
    config: &AppConfig,
) -> Result<DirectoryFixture, CommandResult> {
    DirectoryFixture::load_or_sample(config.directory.fixture_path.as_deref()).map_err(|error| {
        CommandResult::failure(command, "fixture_load", format!("directory issue: {error}"), 4)
    })
}
