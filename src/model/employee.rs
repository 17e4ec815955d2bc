use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "name": "Aiko Tanaka",
        "department": "Nursing",
        "role": "admin",
        "managed_department": "Nursing"
    })
)]
pub struct Employee {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = "Aiko Tanaka")]
    pub name: String,

    #[schema(example = "Nursing", nullable = true)]
    pub department: Option<String>,

    pub role: Role,

    /// Only meaningful for admins. `None` on an admin means every department.
    #[schema(example = "Nursing", nullable = true)]
    pub managed_department: Option<String>,
}

impl Employee {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin with no department restriction.
    pub fn is_global_admin(&self) -> bool {
        self.is_admin() && self.managed_department.is_none()
    }

    /// Department this admin is restricted to, if any.
    pub fn scope(&self) -> Option<&str> {
        if self.is_admin() {
            self.managed_department.as_deref()
        } else {
            None
        }
    }
}
