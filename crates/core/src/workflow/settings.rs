use serde::{Deserialize, Serialize};

use crate::workflow::states::{RoleKind, Track};

/// Role codes as they appear in department role lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCodes {
    pub director: String,
    pub deputy_director: String,
    pub department_head: String,
    pub staff: String,
}

impl Default for RoleCodes {
    fn default() -> Self {
        Self {
            director: "1".to_owned(),
            deputy_director: "2".to_owned(),
            department_head: "3".to_owned(),
            staff: "4".to_owned(),
        }
    }
}

impl RoleCodes {
    pub fn code(&self, kind: RoleKind) -> &str {
        match kind {
            RoleKind::Director => &self.director,
            RoleKind::DeputyDirector => &self.deputy_director,
            RoleKind::DepartmentHead => &self.department_head,
            RoleKind::Staff => &self.staff,
        }
    }
}

/// Parameters substituted into guard templates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    pub technical_department: String,
    pub planning_department: String,
    pub roles: RoleCodes,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            technical_department: "KTh".to_owned(),
            planning_department: "KH".to_owned(),
            roles: RoleCodes::default(),
        }
    }
}

impl WorkflowSettings {
    pub fn department_for(&self, track: Track) -> &str {
        match track {
            Track::Technical => &self.technical_department,
            Track::Planning => &self.planning_department,
        }
    }

    pub fn role_code(&self, kind: RoleKind) -> &str {
        self.roles.code(kind)
    }
}
