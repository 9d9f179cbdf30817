use procura_core::condition::{decompose_condition, describe};

use crate::commands::{load_config, load_fixture, CommandResult};

/// Lists each sub-condition of stored text with directory names filled in.
pub fn run(condition: &str) -> CommandResult {
    let config = match load_config("decompose") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let fixture = match load_fixture("decompose", &config) {
        Ok(fixture) => fixture,
        Err(result) => return result,
    };

    let parsed = match decompose_condition(condition) {
        Ok(parsed) => parsed,
        Err(error) => {
            return CommandResult::failure(
                "decompose",
                "parse_error",
                format!("condition could not be parsed: {error}"),
                5,
            );
        }
    };

    if parsed.is_empty() {
        return CommandResult::success("decompose", "no sub-conditions");
    }

    let lines = describe(&parsed, &fixture.departments, &fixture.employees)
        .iter()
        .enumerate()
        .map(|(index, view)| format!("{}. {view}", index + 1))
        .collect::<Vec<_>>();
    CommandResult::success("decompose", lines.join("\n"))
}
