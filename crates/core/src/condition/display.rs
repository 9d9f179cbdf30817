use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::ast::{Clause, Condition};
use crate::condition::parser::{parse, ParseError};
use crate::domain::{Department, Employee};

/// Structured form of stored condition text, for read-only rendering.
pub fn decompose_condition(text: &str) -> Result<Condition, ParseError> {
    parse(text)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeView {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClauseView {
    Department {
        department_id: String,
        department_name: String,
        role_id: Option<String>,
        role_name: Option<String>,
    },
    Employee {
        members: Vec<EmployeeView>,
    },
}

impl fmt::Display for ClauseView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Department { department_name, role_name: Some(role_name), .. } => {
                write!(f, "{role_name} of {department_name}")
            }
            Self::Department { department_name, role_name: None, .. } => {
                write!(f, "anyone in {department_name}")
            }
            Self::Employee { members } => {
                let names = members.iter().map(|member| member.name.as_str()).collect::<Vec<_>>();
                write!(f, "{}", names.join(", "))
            }
        }
    }
}

/// Resolves ids to display names; unknown ids are shown as-is.
pub fn describe(
    condition: &Condition,
    departments: &[Department],
    employees: &[Employee],
) -> Vec<ClauseView> {
    condition
        .clauses()
        .iter()
        .map(|clause| match clause {
            Clause::Department(clause) => {
                let department = departments
                    .iter()
                    .find(|department| department.id == clause.department_id());
                let role_name = clause.role_id().map(|role_id| {
                    department
                        .and_then(|department| department.role(role_id))
                        .map(|role| role.name.clone())
                        .unwrap_or_else(|| role_id.to_owned())
                });
                ClauseView::Department {
                    department_id: clause.department_id().to_owned(),
                    department_name: department
                        .map(|department| department.name.clone())
                        .unwrap_or_else(|| clause.department_id().to_owned()),
                    role_id: clause.role_id().map(str::to_owned),
                    role_name,
                }
            }
            Clause::Employee(clause) => ClauseView::Employee {
                members: clause
                    .employee_ids()
                    .iter()
                    .map(|id| EmployeeView {
                        id: id.to_owned(),
                        name: employees
                            .iter()
                            .find(|employee| employee.id == id)
                            .map(|employee| employee.name.clone())
                            .unwrap_or_else(|| id.to_owned()),
                    })
                    .collect(),
            },
        })
        .collect()
}
