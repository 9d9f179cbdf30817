use async_trait::async_trait;
use thiserror::Error;

use procura_core::domain::{Department, Employee, PurchaseRequest, RequestId, TransitionRecord};
use procura_core::workflow::RequestState;

pub mod memory;

pub use memory::{
    InMemoryDepartmentRepository, InMemoryEmployeeRepository, InMemoryRequestStateStore,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("request `{0}` not found")]
    RequestNotFound(String),
    #[error(
        "request `{request_id}` moved to {found} before the transition from {expected} was written"
    )]
    StaleStatus { request_id: String, expected: RequestState, found: RequestState },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// All departments, ordered by id.
    async fn list_departments(&self) -> Result<Vec<Department>, RepositoryError>;
    async fn save(&self, department: Department) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Employees whose id is in `ids`; unknown ids are skipped.
    async fn find_employees_by_ids(&self, ids: &[String])
        -> Result<Vec<Employee>, RepositoryError>;
    async fn save(&self, employee: Employee) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait RequestStateStore: Send + Sync {
    async fn find_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<PurchaseRequest>, RepositoryError>;

    async fn save_request(&self, request: PurchaseRequest) -> Result<(), RepositoryError>;

    async fn read_status(&self, id: &RequestId) -> Result<RequestState, RepositoryError>;

    /// Moves the request to `record.to` if it still sits in `record.from`,
    /// and appends the record to its history.
    async fn write_transition(&self, record: TransitionRecord) -> Result<(), RepositoryError>;

    async fn list_transitions(
        &self,
        id: &RequestId,
    ) -> Result<Vec<TransitionRecord>, RepositoryError>;
}
