use thiserror::Error;

use crate::domain::{Department, Employee};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("department `{0}` not found")]
    DepartmentNotFound(String),
    #[error("department `{department_id}` has no role `{role_id}`")]
    RoleNotInDepartment { department_id: String, role_id: String },
    #[error("employee `{0}` not found")]
    EmployeeNotFound(String),
    #[error("request has no recorded requester")]
    MissingRequester,
    #[error("directory record is invalid: {0}")]
    InvalidRecord(String),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

pub trait DepartmentLookup {
    fn list_departments(&self) -> Result<Vec<Department>, LookupError>;

    fn find_department(&self, department_id: &str) -> Result<Option<Department>, LookupError> {
        Ok(self
            .list_departments()?
            .into_iter()
            .find(|department| department.id == department_id))
    }
}

pub trait EmployeeLookup {
    fn find_employees_by_ids(&self, ids: &[String]) -> Result<Vec<Employee>, LookupError>;
}

/// Point-in-time copy of the department and employee directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepartmentDirectory {
    departments: Vec<Department>,
    employees: Vec<Employee>,
}

impl DepartmentDirectory {
    pub fn new(departments: Vec<Department>, employees: Vec<Employee>) -> Self {
        Self { departments, employees }
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|employee| employee.id == id)
    }
}

impl DepartmentLookup for DepartmentDirectory {
    fn list_departments(&self) -> Result<Vec<Department>, LookupError> {
        Ok(self.departments.clone())
    }

    fn find_department(&self, department_id: &str) -> Result<Option<Department>, LookupError> {
        Ok(self.departments.iter().find(|department| department.id == department_id).cloned())
    }
}

impl EmployeeLookup for DepartmentDirectory {
    fn find_employees_by_ids(&self, ids: &[String]) -> Result<Vec<Employee>, LookupError> {
        Ok(self.employees.iter().filter(|employee| ids.contains(&employee.id)).cloned().collect())
    }
}
