use procura_core::condition::{evaluate, parse};
use procura_core::domain::Actor;

use crate::commands::{load_config, load_fixture, CommandResult};

/// Reports whether a directory employee satisfies condition text.
pub fn run(condition: &str, actor_id: &str) -> CommandResult {
    let config = match load_config("check") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let fixture = match load_fixture("check", &config) {
        Ok(fixture) => fixture,
        Err(result) => return result,
    };

    let parsed = match parse(condition) {
        Ok(parsed) => parsed,
        Err(error) => {
            return CommandResult::failure(
                "check",
                "parse_error",
                format!("condition could not be parsed: {error}"),
                5,
            );
        }
    };

    let directory = fixture.directory();
    let Some(employee) = directory.employee(actor_id) else {
        return CommandResult::failure(
            "check",
            "unknown_actor",
            format!("employee `{actor_id}` is not in the directory"),
            7,
        );
    };

    if evaluate(&parsed, &Actor::from(employee)) {
        CommandResult::success("check", format!("`{actor_id}` satisfies the condition"))
    } else {
        CommandResult::failure(
            "check",
            "not_eligible",
            format!("`{actor_id}` does not satisfy the condition"),
            1,
        )
    }
}
