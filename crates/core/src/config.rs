use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::condition::parse;
use crate::workflow::{
    RequestState, RoleCodes, TransitionAction, TransitionTable, WorkflowEngine, WorkflowSettings,
};

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub workflow: WorkflowConfig,
    pub directory: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default)]
pub struct WorkflowConfig {
    pub settings: WorkflowSettings,
    pub guard_overrides: Vec<GuardOverride>,
}

/// Fixed condition text replacing the guard of one edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardOverride {
    pub from: RequestState,
    pub action: OverrideAction,
    #[serde(default)]
    pub to: Option<RequestState>,
    pub condition: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideAction {
    Forward,
    Return,
}

impl GuardOverride {
    pub fn action(&self) -> TransitionAction {
        match self.action {
            OverrideAction::Forward => TransitionAction::Forward(self.to),
            OverrideAction::Return => TransitionAction::Return,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DirectoryConfig {
    pub fixture_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub technical_department: Option<String>,
    pub planning_department: Option<String>,
    pub fixture_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl WorkflowConfig {
    /// Standard transition table with configured guard overrides applied.
    pub fn engine(&self) -> Result<WorkflowEngine, ConfigError> {
        let mut table = TransitionTable::standard();
        for guard in &self.guard_overrides {
            table = table
                .with_literal_guard(guard.from, &guard.action(), guard.condition.clone())
                .map_err(|error| ConfigError::Validation(format!("workflow.guards: {error}")))?;
        }
        Ok(WorkflowEngine::new(table, self.settings.clone()))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("procura.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(workflow) = patch.workflow {
            let settings = &mut self.workflow.settings;
            if let Some(technical_department) = workflow.technical_department {
                settings.technical_department = trimmed(technical_department);
            }
            if let Some(planning_department) = workflow.planning_department {
                settings.planning_department = trimmed(planning_department);
            }
            if let Some(roles) = workflow.roles {
                apply_roles_patch(&mut settings.roles, roles);
            }
            if let Some(guards) = workflow.guards {
                self.workflow.guard_overrides = guards;
            }
        }

        if let Some(directory) = patch.directory {
            if let Some(fixture_path) = directory.fixture_path {
                self.directory.fixture_path = Some(fixture_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = trimmed(level);
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let settings = &mut self.workflow.settings;
        if let Some(value) = read_env("PROCURA_WORKFLOW_TECHNICAL_DEPARTMENT") {
            settings.technical_department = trimmed(value);
        }
        if let Some(value) = read_env("PROCURA_WORKFLOW_PLANNING_DEPARTMENT") {
            settings.planning_department = trimmed(value);
        }
        if let Some(value) = read_env("PROCURA_ROLE_DIRECTOR") {
            settings.roles.director = trimmed(value);
        }
        if let Some(value) = read_env("PROCURA_ROLE_DEPUTY_DIRECTOR") {
            settings.roles.deputy_director = trimmed(value);
        }
        if let Some(value) = read_env("PROCURA_ROLE_DEPARTMENT_HEAD") {
            settings.roles.department_head = trimmed(value);
        }
        if let Some(value) = read_env("PROCURA_ROLE_STAFF") {
            settings.roles.staff = trimmed(value);
        }

        if let Some(value) = read_env("PROCURA_DIRECTORY_FIXTURE_PATH") {
            self.directory.fixture_path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("PROCURA_LOGGING_LEVEL").or_else(|| read_env("PROCURA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = trimmed(value);
        }
        let log_format =
            read_env("PROCURA_LOGGING_FORMAT").or_else(|| read_env("PROCURA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "PROCURA_LOGGING_FORMAT".to_string(),
                value: value.clone(),
            })?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(technical_department) = overrides.technical_department {
            self.workflow.settings.technical_department = trimmed(technical_department);
        }
        if let Some(planning_department) = overrides.planning_department {
            self.workflow.settings.planning_department = trimmed(planning_department);
        }
        if let Some(fixture_path) = overrides.fixture_path {
            self.directory.fixture_path = Some(fixture_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = trimmed(log_level);
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_workflow(&self.workflow)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn apply_roles_patch(roles: &mut RoleCodes, patch: RolesPatch) {
    if let Some(director) = patch.director {
        roles.director = trimmed(director);
    }
    if let Some(deputy_director) = patch.deputy_director {
        roles.deputy_director = trimmed(deputy_director);
    }
    if let Some(department_head) = patch.department_head {
        roles.department_head = trimmed(department_head);
    }
    if let Some(staff) = patch.staff {
        roles.staff = trimmed(staff);
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("procura.toml"), PathBuf::from("config/procura.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_workflow(workflow: &WorkflowConfig) -> Result<(), ConfigError> {
    let settings = &workflow.settings;
    let technical = settings.technical_department.trim();
    let planning = settings.planning_department.trim();
    if technical.is_empty() || planning.is_empty() {
        return Err(ConfigError::Validation(
            "workflow.technical_department and workflow.planning_department must not be blank"
                .to_string(),
        ));
    }
    if technical == planning {
        return Err(ConfigError::Validation(format!(
            "workflow.technical_department and workflow.planning_department must differ (both `{technical}`)"
        )));
    }

    let roles = [
        ("director", &settings.roles.director),
        ("deputy_director", &settings.roles.deputy_director),
        ("department_head", &settings.roles.department_head),
        ("staff", &settings.roles.staff),
    ];
    let mut seen = HashSet::new();
    for (name, code) in roles {
        let code = code.trim();
        if code.is_empty() {
            return Err(ConfigError::Validation(format!(
                "workflow.roles.{name} must not be blank"
            )));
        }
        if !seen.insert(code) {
            return Err(ConfigError::Validation(format!(
                "workflow.roles.{name} reuses role code `{code}`"
            )));
        }
    }

    for guard in &workflow.guard_overrides {
        parse(&guard.condition).map_err(|error| {
            ConfigError::Validation(format!(
                "workflow.guards entry for {} {} has an invalid condition: {error}",
                guard.from,
                guard.action()
            ))
        })?;
    }
    workflow.engine()?;

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

/// Department and role codes are compared verbatim against the directory.
fn trimmed(value: String) -> String {
    value.trim().to_owned()
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    workflow: Option<WorkflowPatch>,
    directory: Option<DirectoryPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowPatch {
    technical_department: Option<String>,
    planning_department: Option<String>,
    roles: Option<RolesPatch>,
    guards: Option<Vec<GuardOverride>>,
}

#[derive(Debug, Default, Deserialize)]
struct RolesPatch {
    director: Option<String>,
    deputy_director: Option<String>,
    department_head: Option<String>,
    staff: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryPatch {
    fixture_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::workflow::{RequestState, TransitionAction};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> Result<PathBuf, String> {
        let path = dir.path().join("procura.toml");
        fs::write(&path, body).map_err(|err| err.to_string())?;
        Ok(path)
    }

    #[test]
    fn defaults_match_the_standard_chain() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.workflow.settings.technical_department == "KTh",
            "technical track should default to KTh",
        )?;
        ensure(
            config.workflow.settings.planning_department == "KH",
            "planning track should default to KH",
        )?;
        ensure(config.workflow.settings.roles.department_head == "3", "head role code is 3")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "default format is compact")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PROCURA_TECH_DEPT", "TECH-01");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[workflow]
technical_department = "${TEST_PROCURA_TECH_DEPT}"

[workflow.roles]
staff = "S"
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.workflow.settings.technical_department == "TECH-01",
                "technical department should be interpolated from environment",
            )?;
            ensure(config.workflow.settings.roles.staff == "S", "staff code comes from file")
        })();

        clear_vars(&["TEST_PROCURA_TECH_DEPT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROCURA_WORKFLOW_PLANNING_DEPARTMENT", "PLAN-ENV");
        env::set_var("PROCURA_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[workflow]
technical_department = "TECH-FILE"
planning_department = "PLAN-FILE"

[logging]
level = "warn"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    technical_department: Some("TECH-OVERRIDE".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.workflow.settings.technical_department == "TECH-OVERRIDE",
                "override should win over file",
            )?;
            ensure(
                config.workflow.settings.planning_department == "PLAN-ENV",
                "env should win over file",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "log format alias should be read from env",
            )
        })();

        clear_vars(&["PROCURA_WORKFLOW_PLANNING_DEPARTMENT", "PROCURA_LOG_FORMAT"]);
        result
    }

    #[test]
    fn guard_overrides_are_loaded_and_applied() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[[workflow.guards]]
from = "A2"
action = "forward"
to = "A5"
condition = '(id = "e42")'
"#,
        )?;

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .map_err(|err| format!("config load failed: {err}"))?;
        let engine = config.workflow.engine().map_err(|err| err.to_string())?;
        let transition = engine
            .table()
            .select(RequestState::A2, &TransitionAction::forward_to(RequestState::A5))
            .map_err(|err| err.to_string())?;

        ensure(config.workflow.guard_overrides.len() == 1, "one override should be loaded")?;
        ensure(
            transition.guard.describe() == r#"requires a match for `(id = "e42")`"#,
            "override should replace the A2 -> A5 guard",
        )
    }

    #[test]
    fn invalid_guard_override_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[[workflow.guards]]
from = "A8"
action = "return"
condition = '(id = "e1")'
"#,
        )?;

        let error = match AppConfig::load(LoadOptions {
            config_path: Some(path),
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("override on a terminal state should fail".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("workflow.guards")),
            "validation failure should mention workflow.guards",
        )
    }

    #[test]
    fn validation_rejects_shared_track_department() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                technical_department: Some("KH".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected validation failure".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("must differ")),
            "validation failure should explain the shared department",
        )
    }

    #[test]
    fn validation_rejects_duplicate_role_codes() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROCURA_ROLE_STAFF", "3");
        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected duplicate role code failure".to_string()),
            Err(error) => ensure(
                matches!(error, ConfigError::Validation(ref message) if message.contains("workflow.roles.staff")),
                "validation failure should name the duplicate role",
            ),
        };

        clear_vars(&["PROCURA_ROLE_STAFF"]);
        result
    }

    #[test]
    fn padded_codes_are_stored_trimmed() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROCURA_WORKFLOW_TECHNICAL_DEPARTMENT", " KTh ");
        env::set_var("PROCURA_ROLE_STAFF", "4 ");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[workflow.roles]
director = " 1"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    planning_department: Some("  KH".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;
            let settings = &config.workflow.settings;

            ensure(settings.technical_department == "KTh", "env department should be trimmed")?;
            ensure(settings.planning_department == "KH", "override department should be trimmed")?;
            ensure(settings.roles.director == "1", "file role code should be trimmed")?;
            ensure(settings.roles.staff == "4", "env role code should be trimmed")
        })();

        clear_vars(&["PROCURA_WORKFLOW_TECHNICAL_DEPARTMENT", "PROCURA_ROLE_STAFF"]);
        result
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");
        let error = match AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected missing file failure".to_string()),
            Err(error) => error,
        };
        ensure(matches!(error, ConfigError::MissingConfigFile(_)), "missing file is reported")
    }
}
