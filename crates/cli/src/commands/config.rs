use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use procura_core::config::AppConfig;
use toml::Value;

use crate::commands::{load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };
    CommandResult::success("config", render(&config))
}

fn render(config: &AppConfig) -> String {
    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let settings = &config.workflow.settings;
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "workflow.technical_department",
        &settings.technical_department,
        source("workflow.technical_department", &["PROCURA_WORKFLOW_TECHNICAL_DEPARTMENT"]),
    ));
    lines.push(render_line(
        "workflow.planning_department",
        &settings.planning_department,
        source("workflow.planning_department", &["PROCURA_WORKFLOW_PLANNING_DEPARTMENT"]),
    ));

    for (key, value, env_key) in [
        ("workflow.roles.director", &settings.roles.director, "PROCURA_ROLE_DIRECTOR"),
        (
            "workflow.roles.deputy_director",
            &settings.roles.deputy_director,
            "PROCURA_ROLE_DEPUTY_DIRECTOR",
        ),
        (
            "workflow.roles.department_head",
            &settings.roles.department_head,
            "PROCURA_ROLE_DEPARTMENT_HEAD",
        ),
        ("workflow.roles.staff", &settings.roles.staff, "PROCURA_ROLE_STAFF"),
    ] {
        lines.push(render_line(key, value, source(key, &[env_key])));
    }

    for guard in &config.workflow.guard_overrides {
        lines.push(render_line(
            &format!("workflow.guards[{} {}]", guard.from, guard.action()),
            &guard.condition,
            source("workflow.guards", &[]),
        ));
    }

    let fixture_path = config
        .directory
        .fixture_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<bundled sample>".to_string());
    lines.push(render_line(
        "directory.fixture_path",
        &fixture_path,
        source("directory.fixture_path", &["PROCURA_DIRECTORY_FIXTURE_PATH"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["PROCURA_LOGGING_LEVEL", "PROCURA_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["PROCURA_LOGGING_FORMAT", "PROCURA_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("procura.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/procura.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
