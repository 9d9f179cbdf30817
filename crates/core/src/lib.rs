pub mod audit;
pub mod condition;
pub mod config;
pub mod domain;
pub mod errors;
pub mod workflow;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink};
pub use condition::{
    build_condition, decompose_condition, evaluate, evaluate_text, parse, serialize, Clause,
    ClauseDraft, ClauseView, Condition, ParseError,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::{Actor, Department, Employee, PurchaseRequest, RequestId, Role, TransitionRecord};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use workflow::{
    DepartmentDirectory, DepartmentLookup, EmployeeLookup, LookupError, RequestState,
    TransitionAction, WorkflowContext, WorkflowEngine, WorkflowError, WorkflowSettings,
};
