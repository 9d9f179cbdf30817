use procura_core::condition::{build_condition, ClauseDraft};

use crate::commands::CommandResult;

/// Turns a JSON array of clause drafts into canonical condition text.
pub fn run(clauses_json: &str) -> CommandResult {
    let drafts = match serde_json::from_str::<Vec<ClauseDraft>>(clauses_json) {
        Ok(drafts) => drafts,
        Err(error) => {
            return CommandResult::failure(
                "build",
                "invalid_input",
                format!("clause drafts must be a JSON array: {error}"),
                5,
            );
        }
    };

    CommandResult::success("build", build_condition(&drafts))
}
