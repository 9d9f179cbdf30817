use std::collections::HashMap;

use tokio::sync::RwLock;

use procura_core::domain::{Department, Employee, PurchaseRequest, RequestId, TransitionRecord};
use procura_core::workflow::RequestState;

use super::{DepartmentRepository, EmployeeRepository, RepositoryError, RequestStateStore};

#[derive(Default)]
pub struct InMemoryDepartmentRepository {
    departments: RwLock<HashMap<String, Department>>,
}

#[async_trait::async_trait]
impl DepartmentRepository for InMemoryDepartmentRepository {
    async fn list_departments(&self) -> Result<Vec<Department>, RepositoryError> {
        let departments = self.departments.read().await;
        let mut listed = departments.values().cloned().collect::<Vec<_>>();
        listed.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(listed)
    }

    async fn save(&self, department: Department) -> Result<(), RepositoryError> {
        let mut departments = self.departments.write().await;
        departments.insert(department.id.clone(), department);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEmployeeRepository {
    employees: RwLock<HashMap<String, Employee>>,
}

#[async_trait::async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn find_employees_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<Employee>, RepositoryError> {
        let employees = self.employees.read().await;
        Ok(ids.iter().filter_map(|id| employees.get(id).cloned()).collect())
    }

    async fn save(&self, employee: Employee) -> Result<(), RepositoryError> {
        let mut employees = self.employees.write().await;
        employees.insert(employee.id.clone(), employee);
        Ok(())
    }
}

#[derive(Default)]
struct RequestBook {
    requests: HashMap<String, PurchaseRequest>,
    history: Vec<TransitionRecord>,
}

#[derive(Default)]
pub struct InMemoryRequestStateStore {
    book: RwLock<RequestBook>,
}

#[async_trait::async_trait]
impl RequestStateStore for InMemoryRequestStateStore {
    async fn find_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<PurchaseRequest>, RepositoryError> {
        let book = self.book.read().await;
        Ok(book.requests.get(&id.0).cloned())
    }

    async fn save_request(&self, request: PurchaseRequest) -> Result<(), RepositoryError> {
        let mut book = self.book.write().await;
        book.requests.insert(request.id.0.clone(), request);
        Ok(())
    }

    async fn read_status(&self, id: &RequestId) -> Result<RequestState, RepositoryError> {
        let book = self.book.read().await;
        book.requests
            .get(&id.0)
            .map(|request| request.status)
            .ok_or_else(|| RepositoryError::RequestNotFound(id.0.clone()))
    }

    async fn write_transition(&self, record: TransitionRecord) -> Result<(), RepositoryError> {
        let mut book = self.book.write().await;
        let request = book
            .requests
            .get_mut(&record.request_id.0)
            .ok_or_else(|| RepositoryError::RequestNotFound(record.request_id.0.clone()))?;
        if request.status != record.from {
            return Err(RepositoryError::StaleStatus {
                request_id: record.request_id.0.clone(),
                expected: record.from,
                found: request.status,
            });
        }
        request.status = record.to;
        request.next_condition = record.next_condition.clone();
        book.history.push(record);
        Ok(())
    }

    async fn list_transitions(
        &self,
        id: &RequestId,
    ) -> Result<Vec<TransitionRecord>, RepositoryError> {
        let book = self.book.read().await;
        Ok(book.history.iter().filter(|record| record.request_id == *id).cloned().collect())
    }
}
