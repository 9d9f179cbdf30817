use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("`{field}` must not be blank")]
    BlankValue { field: &'static str },
    #[error("`{field}` value `{value}` contains both quote characters and cannot be written")]
    UnquotableValue { field: &'static str, value: String },
    #[error("an employee clause needs at least one employee id")]
    EmptyEmployeeSet,
}

/// Department match, optionally narrowed to one department-scoped role.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DepartmentClauseRecord", into = "DepartmentClauseRecord")]
pub struct DepartmentClause {
    department_id: String,
    role_id: Option<String>,
}

impl DepartmentClause {
    pub fn new(
        department_id: impl Into<String>,
        role_id: Option<String>,
    ) -> Result<Self, ConditionError> {
        let department_id = checked_value("department_id", department_id.into())?;
        let role_id = role_id.map(|role| checked_value("role_id", role)).transpose()?;
        Ok(Self { department_id, role_id })
    }

    pub fn department_id(&self) -> &str {
        &self.department_id
    }

    pub fn role_id(&self) -> Option<&str> {
        self.role_id.as_deref()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DepartmentClauseRecord {
    department_id: String,
    #[serde(default)]
    role_id: Option<String>,
}

impl TryFrom<DepartmentClauseRecord> for DepartmentClause {
    type Error = ConditionError;

    fn try_from(value: DepartmentClauseRecord) -> Result<Self, Self::Error> {
        Self::new(value.department_id, value.role_id)
    }
}

impl From<DepartmentClause> for DepartmentClauseRecord {
    fn from(value: DepartmentClause) -> Self {
        Self { department_id: value.department_id, role_id: value.role_id }
    }
}

/// Ordered, de-duplicated, never-empty set of employee ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct EmployeeIds(Vec<String>);

impl EmployeeIds {
    pub fn new<I, S>(ids: I) -> Result<Self, ConditionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for id in ids {
            let id = checked_value("employee_id", id.into())?;
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        if unique.is_empty() {
            return Err(ConditionError::EmptyEmployeeSet);
        }
        Ok(Self(unique))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|candidate| candidate == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for EmployeeIds {
    type Error = ConditionError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmployeeIds> for Vec<String> {
    fn from(value: EmployeeIds) -> Self {
        value.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeClause {
    employee_ids: EmployeeIds,
}

impl EmployeeClause {
    pub fn new(employee_ids: EmployeeIds) -> Self {
        Self { employee_ids }
    }

    pub fn employee_ids(&self) -> &EmployeeIds {
        &self.employee_ids
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Clause {
    Department(DepartmentClause),
    Employee(EmployeeClause),
}

impl Clause {
    pub fn department(
        department_id: impl Into<String>,
        role_id: Option<String>,
    ) -> Result<Self, ConditionError> {
        Ok(Self::Department(DepartmentClause::new(department_id, role_id)?))
    }

    pub fn department_role(
        department_id: impl Into<String>,
        role_id: impl Into<String>,
    ) -> Result<Self, ConditionError> {
        Self::department(department_id, Some(role_id.into()))
    }

    pub fn employees<I, S>(ids: I) -> Result<Self, ConditionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::Employee(EmployeeClause::new(EmployeeIds::new(ids)?)))
    }
}

/// Clauses OR'd together, in source order.
///
/// The empty condition names no eligible actor; it is not "unrestricted".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition {
    clauses: Vec<Clause>,
}

impl Condition {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn or(mut self, other: Condition) -> Self {
        self.clauses.extend(other.clauses);
        self
    }
}

impl From<Vec<Clause>> for Condition {
    fn from(clauses: Vec<Clause>) -> Self {
        Self::new(clauses)
    }
}

impl FromIterator<Clause> for Condition {
    fn from_iter<T: IntoIterator<Item = Clause>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Values are kept byte-for-byte; only all-whitespace values are rejected.
pub(crate) fn checked_value(field: &'static str, value: String) -> Result<String, ConditionError> {
    if value.trim().is_empty() {
        return Err(ConditionError::BlankValue { field });
    }
    if value.contains('"') && value.contains('\'') {
        return Err(ConditionError::UnquotableValue { field, value });
    }
    Ok(value)
}
