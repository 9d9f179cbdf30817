pub mod ast;
pub mod display;
pub mod evaluator;
pub mod parser;
pub mod serializer;

pub use ast::{Clause, Condition, ConditionError, DepartmentClause, EmployeeClause, EmployeeIds};
pub use display::{decompose_condition, describe, ClauseView, EmployeeView};
pub use evaluator::{evaluate, evaluate_text, EMPTY_CONDITION_SATISFIED};
pub use parser::{parse, ParseError};
pub use serializer::{build_condition, serialize, ClauseDraft};
