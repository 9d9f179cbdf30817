pub mod fixtures;
pub mod repositories;
pub mod service;

pub use fixtures::{DirectoryFixture, FixtureError, SeedResult};
pub use repositories::{
    DepartmentRepository, EmployeeRepository, InMemoryDepartmentRepository,
    InMemoryEmployeeRepository, InMemoryRequestStateStore, RepositoryError, RequestStateStore,
};
pub use service::{ServiceError, WorkflowService};
