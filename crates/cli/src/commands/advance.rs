use std::sync::Arc;

use clap::ValueEnum;
use procura_core::audit::InMemoryAuditSink;
use procura_core::domain::RequestId;
use procura_core::errors::ApplicationError;
use procura_core::workflow::{RequestState, TransitionAction};
use procura_db::{
    InMemoryDepartmentRepository, InMemoryEmployeeRepository, InMemoryRequestStateStore,
    WorkflowService,
};
use uuid::Uuid;

use crate::commands::{load_config, load_fixture, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    Forward,
    Return,
}

#[derive(Clone, Debug)]
pub struct AdvanceArgs {
    pub request: String,
    pub action: ActionArg,
    pub to: Option<RequestState>,
    pub actor: String,
    pub note: Option<String>,
}

impl AdvanceArgs {
    fn transition_action(&self) -> Result<TransitionAction, String> {
        match (self.action, self.to) {
            (ActionArg::Forward, target) => Ok(TransitionAction::Forward(target)),
            (ActionArg::Return, None) => Ok(TransitionAction::Return),
            (ActionArg::Return, Some(target)) => {
                Err(format!("`--to {target}` only applies to forward actions"))
            }
        }
    }
}

/// Applies one action to a request in the loaded directory. Changes are not
/// written back to the fixture.
pub fn run(args: AdvanceArgs) -> CommandResult {
    let action = match args.transition_action() {
        Ok(action) => action,
        Err(message) => return CommandResult::failure("advance", "invalid_input", message, 5),
    };
    let config = match load_config("advance") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let fixture = match load_fixture("advance", &config) {
        Ok(fixture) => fixture,
        Err(result) => return result,
    };
    let engine = match config.workflow.engine() {
        Ok(engine) => engine,
        Err(error) => {
            return CommandResult::failure(
                "advance",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "advance",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let correlation_id = Uuid::new_v4().to_string();
    let result = runtime.block_on(async {
        let departments = Arc::new(InMemoryDepartmentRepository::default());
        let employees = Arc::new(InMemoryEmployeeRepository::default());
        let requests = Arc::new(InMemoryRequestStateStore::default());
        fixture
            .seed(departments.as_ref(), employees.as_ref(), requests.as_ref())
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;

        let service = WorkflowService::new(
            engine,
            departments,
            employees,
            requests,
            Arc::new(InMemoryAuditSink::default()),
        );
        service
            .advance(&RequestId(args.request.clone()), action, &args.actor, args.note.clone())
            .await
            .map_err(ApplicationError::from)
    });

    match result {
        Ok(record) => {
            let next = if record.next_condition.is_empty() {
                "nobody (request is closed)".to_string()
            } else {
                record.next_condition.clone()
            };
            CommandResult::success(
                "advance",
                format!(
                    "{} moved {} -> {}; next eligible: {next}",
                    record.request_id.0, record.from, record.to
                ),
            )
        }
        Err(error) => {
            CommandResult::from_interface("advance", error.into_interface(correlation_id))
        }
    }
}
