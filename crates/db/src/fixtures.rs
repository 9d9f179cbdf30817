use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use procura_core::domain::{Department, Employee, PurchaseRequest};
use procura_core::workflow::DepartmentDirectory;

use crate::repositories::{
    DepartmentRepository, EmployeeRepository, RepositoryError, RequestStateStore,
};

const SAMPLE_DIRECTORY: &str = include_str!("../fixtures/directory.json");

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("could not read fixture `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not decode fixture: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("fixture is inconsistent: {0}")]
    Invalid(String),
}

/// Departments, employees and open requests loaded from JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFixture {
    pub departments: Vec<Department>,
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub requests: Vec<PurchaseRequest>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub departments: usize,
    pub employees: usize,
    pub requests: usize,
}

impl DirectoryFixture {
    /// The bundled sample organisation.
    pub fn sample() -> Result<Self, FixtureError> {
        Self::from_json(SAMPLE_DIRECTORY)
    }

    pub fn from_json(raw: &str) -> Result<Self, FixtureError> {
        let fixture: Self = serde_json::from_str(raw)?;
        fixture.validate()?;
        Ok(fixture)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| FixtureError::Read { path: path.to_path_buf(), source })?;
        Self::from_json(&raw)
    }

    /// Loads `path` when given, the bundled sample otherwise.
    pub fn load_or_sample(path: Option<&Path>) -> Result<Self, FixtureError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::sample(),
        }
    }

    pub fn validate(&self) -> Result<(), FixtureError> {
        let mut department_ids = HashSet::new();
        for department in &self.departments {
            if !department_ids.insert(department.id.as_str()) {
                return Err(FixtureError::Invalid(format!(
                    "department `{}` is listed twice",
                    department.id
                )));
            }
        }

        let mut employee_ids = HashSet::new();
        for employee in &self.employees {
            if !employee_ids.insert(employee.id.as_str()) {
                return Err(FixtureError::Invalid(format!(
                    "employee `{}` is listed twice",
                    employee.id
                )));
            }
            let department = self
                .departments
                .iter()
                .find(|department| department.id == employee.department_id)
                .ok_or_else(|| {
                    FixtureError::Invalid(format!(
                        "employee `{}` belongs to unknown department `{}`",
                        employee.id, employee.department_id
                    ))
                })?;
            if !department.has_role(&employee.role_id) {
                return Err(FixtureError::Invalid(format!(
                    "employee `{}` holds role `{}` which department `{}` does not define",
                    employee.id, employee.role_id, department.id
                )));
            }
        }

        for request in &self.requests {
            if !employee_ids.contains(request.requester_id.as_str()) {
                return Err(FixtureError::Invalid(format!(
                    "request `{}` names unknown requester `{}`",
                    request.id.0, request.requester_id
                )));
            }
        }

        Ok(())
    }

    pub fn directory(&self) -> DepartmentDirectory {
        DepartmentDirectory::new(self.departments.clone(), self.employees.clone())
    }

    pub async fn seed(
        &self,
        departments: &dyn DepartmentRepository,
        employees: &dyn EmployeeRepository,
        requests: &dyn RequestStateStore,
    ) -> Result<SeedResult, RepositoryError> {
        for department in &self.departments {
            departments.save(department.clone()).await?;
        }
        for employee in &self.employees {
            employees.save(employee.clone()).await?;
        }
        for request in &self.requests {
            requests.save_request(request.clone()).await?;
        }

        Ok(SeedResult {
            departments: self.departments.len(),
            employees: self.employees.len(),
            requests: self.requests.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use procura_core::domain::RequestId;
    use procura_core::workflow::{DepartmentLookup, RequestState};

    use crate::fixtures::{DirectoryFixture, FixtureError};
    use crate::repositories::{
        DepartmentRepository, InMemoryDepartmentRepository, InMemoryEmployeeRepository,
        InMemoryRequestStateStore, RequestStateStore,
    };

    #[test]
    fn bundled_sample_is_consistent() {
        let fixture = DirectoryFixture::sample().expect("sample loads");

        assert!(fixture.departments.iter().any(|department| department.id == "KTh"));
        assert!(fixture.departments.iter().any(|department| department.id == "KH"));
        let directory = fixture.directory();
        assert!(directory.find_department("BGD").expect("lookup").is_some());
        assert!(directory.employee("e-kh-staff").is_some());
    }

    #[test]
    fn employee_in_unknown_department_is_rejected() {
        let raw = r#"{
            "departments": [{ "id": "KTh", "name": "Technical", "roles": [{ "id": "4", "name": "Staff" }] }],
            "employees": [{ "id": "e1", "name": "A", "department_id": "KX", "role_id": "4" }]
        }"#;

        let error = DirectoryFixture::from_json(raw).expect_err("inconsistent fixture");
        assert!(matches!(error, FixtureError::Invalid(ref message) if message.contains("KX")));
    }

    #[test]
    fn employee_role_must_exist_in_department() {
        let raw = r#"{
            "departments": [{ "id": "KTh", "name": "Technical", "roles": [{ "id": "4", "name": "Staff" }] }],
            "employees": [{ "id": "e1", "name": "A", "department_id": "KTh", "role_id": "3" }]
        }"#;

        assert!(matches!(DirectoryFixture::from_json(raw), Err(FixtureError::Invalid(_))));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("directory.json");
        fs::write(
            &path,
            r#"{ "departments": [{ "id": "KH", "name": "Planning" }], "employees": [] }"#,
        )
        .expect("write fixture");

        let fixture = DirectoryFixture::load(&path).expect("fixture loads");
        assert_eq!(fixture.departments.len(), 1);
        assert!(fixture.requests.is_empty());
    }

    #[tokio::test]
    async fn seed_populates_repositories() {
        let fixture = DirectoryFixture::sample().expect("sample loads");
        let departments = InMemoryDepartmentRepository::default();
        let employees = InMemoryEmployeeRepository::default();
        let requests = InMemoryRequestStateStore::default();

        let seeded = fixture.seed(&departments, &employees, &requests).await.expect("seed");

        assert_eq!(seeded.departments, fixture.departments.len());
        assert_eq!(departments.list_departments().await.expect("list").len(), seeded.departments);
        assert_eq!(
            requests.read_status(&RequestId("PR-1003".to_string())).await.expect("status"),
            RequestState::A7
        );
    }
}
