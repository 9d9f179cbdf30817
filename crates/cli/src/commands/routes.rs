use procura_core::condition::serialize;
use procura_core::workflow::{RequestState, WorkflowContext};

use crate::commands::{load_config, load_fixture, CommandResult};

/// Lists the transition table with each guard resolved against the directory.
pub fn run(state: Option<RequestState>) -> CommandResult {
    let config = match load_config("routes") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let fixture = match load_fixture("routes", &config) {
        Ok(fixture) => fixture,
        Err(result) => return result,
    };
    let engine = match config.workflow.engine() {
        Ok(engine) => engine,
        Err(error) => {
            return CommandResult::failure(
                "routes",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let directory = fixture.directory();
    let context = WorkflowContext::new(&directory);
    let lines = engine
        .table()
        .transitions()
        .iter()
        .filter(|transition| state.map_or(true, |state| transition.from == state))
        .map(|transition| {
            let resolved = match engine.resolve_guard(transition, &context) {
                Ok(condition) if condition.is_empty() => "nobody".to_string(),
                Ok(condition) => serialize(&condition),
                Err(error) => format!("depends on the request ({error})"),
            };
            format!(
                "{} {} -> {}: {}; eligible: {resolved}",
                transition.from,
                transition.kind,
                transition.to,
                transition.guard.describe()
            )
        })
        .collect::<Vec<_>>();

    if lines.is_empty() {
        let state = state.map(|state| state.to_string()).unwrap_or_else(|| "table".to_string());
        return CommandResult::success("routes", format!("{state} has no outgoing transitions"));
    }
    CommandResult::success("routes", lines.join("\n"))
}
