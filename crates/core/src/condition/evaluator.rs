use tracing::warn;

use crate::condition::ast::{Clause, Condition, DepartmentClause, EmployeeClause};
use crate::condition::parser::parse;
use crate::domain::Actor;

/// Whether a condition with zero clauses admits anyone.
pub const EMPTY_CONDITION_SATISFIED: bool = false;

pub fn evaluate(condition: &Condition, actor: &Actor) -> bool {
    if condition.is_empty() {
        return EMPTY_CONDITION_SATISFIED;
    }
    condition.clauses().iter().any(|clause| clause.is_satisfied_by(actor))
}

/// Parses and evaluates stored text. Unparseable text admits nobody.
pub fn evaluate_text(text: &str, actor: &Actor) -> bool {
    match parse(text) {
        Ok(condition) => evaluate(&condition, actor),
        Err(error) => {
            warn!(
                event_name = "condition.parse_failed",
                condition = text,
                error = %error,
                actor_id = actor.id.as_str(),
                "stored condition could not be parsed; treating as no eligible actor"
            );
            false
        }
    }
}

impl Clause {
    pub fn is_satisfied_by(&self, actor: &Actor) -> bool {
        match self {
            Self::Department(clause) => clause.is_satisfied_by(actor),
            Self::Employee(clause) => clause.is_satisfied_by(actor),
        }
    }
}

impl DepartmentClause {
    pub fn is_satisfied_by(&self, actor: &Actor) -> bool {
        actor.department_id == self.department_id()
            && self.role_id().map_or(true, |role_id| role_id == actor.role_id)
    }
}

impl EmployeeClause {
    pub fn is_satisfied_by(&self, actor: &Actor) -> bool {
        self.employee_ids().contains(&actor.id)
    }
}
