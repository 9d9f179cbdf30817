pub mod engine;
pub mod lookup;
pub mod settings;
pub mod states;
pub mod table;

pub use engine::{WorkflowContext, WorkflowEngine, WorkflowError};
pub use lookup::{DepartmentDirectory, DepartmentLookup, EmployeeLookup, LookupError};
pub use settings::{RoleCodes, WorkflowSettings};
pub use states::{ActionKind, RequestState, RoleKind, Track, TransitionAction, UnknownState};
pub use table::{GuardSpec, GuardTerm, Transition, TransitionTable};
