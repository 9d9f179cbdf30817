use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

/// A department and the roles scoped to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Department {
    pub fn role(&self, role_id: &str) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == role_id)
    }

    pub fn has_role(&self, role_id: &str) -> bool {
        self.role(role_id).is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub department_id: String,
    pub role_id: String,
}

/// The employee attempting an action, as seen by the evaluator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub department_id: String,
    pub role_id: String,
}

impl Actor {
    pub fn new(
        id: impl Into<String>,
        department_id: impl Into<String>,
        role_id: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), department_id: department_id.into(), role_id: role_id.into() }
    }
}

impl From<&Employee> for Actor {
    fn from(employee: &Employee) -> Self {
        Self::new(&employee.id, &employee.department_id, &employee.role_id)
    }
}
