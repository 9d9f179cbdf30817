use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::condition::ast::{Clause, Condition};

/// Writes the canonical text form of a condition.
pub fn serialize(condition: &Condition) -> String {
    condition.clauses().iter().map(serialize_clause).collect::<Vec<_>>().join(" || ")
}

pub fn serialize_clause(clause: &Clause) -> String {
    match clause {
        Clause::Department(department) => match department.role_id() {
            Some(role_id) => format!(
                "(department = {} && role = {})",
                quote(department.department_id()),
                quote(role_id)
            ),
            None => format!("(department = {})", quote(department.department_id())),
        },
        Clause::Employee(employee) => {
            let terms = employee
                .employee_ids()
                .iter()
                .map(|id| format!("id = {}", quote(id)))
                .collect::<Vec<_>>();
            format!("({})", terms.join(" || "))
        }
    }
}

fn quote(value: &str) -> String {
    if value.contains('"') {
        format!("'{value}'")
    } else {
        format!("\"{value}\"")
    }
}

/// One sub-condition as a form collects it, before validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClauseDraft {
    Department {
        #[serde(default)]
        department_id: String,
        #[serde(default)]
        role_id: Option<String>,
    },
    Employee {
        #[serde(default)]
        employee_ids: Vec<String>,
    },
}

impl ClauseDraft {
    /// Incomplete drafts yield `None`; a blank role means "any role".
    /// Form input is trimmed here, never in the parser.
    pub fn to_clause(&self) -> Option<Clause> {
        let result = match self {
            Self::Department { department_id, role_id } => {
                let role_id = role_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|role| !role.is_empty())
                    .map(str::to_owned);
                Clause::department(department_id.trim(), role_id)
            }
            Self::Employee { employee_ids } => Clause::employees(
                employee_ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()),
            ),
        };

        match result {
            Ok(clause) => Some(clause),
            Err(error) => {
                debug!(
                    event_name = "condition.draft_skipped",
                    reason = %error,
                    "skipping incomplete clause draft"
                );
                None
            }
        }
    }
}

pub fn build_condition(drafts: &[ClauseDraft]) -> String {
    let condition = drafts.iter().filter_map(ClauseDraft::to_clause).collect::<Condition>();
    serialize(&condition)
}
