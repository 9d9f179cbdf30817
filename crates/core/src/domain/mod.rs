pub mod directory;
pub mod request;

pub use directory::{Actor, Department, Employee, Role};
pub use request::{PurchaseRequest, RequestId, TransitionRecord};
