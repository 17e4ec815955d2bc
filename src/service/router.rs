use std::sync::Arc;

use crate::error::AppError;
use crate::model::employee::Employee;
use crate::store::Store;

/// Whether `approver` may be assigned requests from `submitter_department`.
/// Global admins are always valid; scoped admins only for their department.
pub fn validate_assignment(submitter_department: Option<&str>, approver: &Employee) -> bool {
    if !approver.is_admin() {
        return false;
    }
    match approver.scope() {
        None => true,
        Some(scope) => submitter_department == Some(scope),
    }
}

/// Admins able to approve requests from `submitter_department`: the
/// department's own admins first, then global admins, each group by name.
pub fn eligible_approvers(admins: &[Employee], submitter_department: Option<&str>) -> Vec<Employee> {
    let mut eligible: Vec<Employee> = admins
        .iter()
        .filter(|a| validate_assignment(submitter_department, a))
        .cloned()
        .collect();
    eligible.sort_by(|a, b| {
        a.managed_department
            .is_none()
            .cmp(&b.managed_department.is_none())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
    eligible
}

#[derive(Clone)]
pub struct RequestRouter {
    store: Arc<dyn Store>,
}

impl RequestRouter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn eligible_approvers(
        &self,
        submitter_department: Option<&str>,
    ) -> Result<Vec<Employee>, AppError> {
        let admins = self.store.list_admins().await?;
        Ok(eligible_approvers(&admins, submitter_department))
    }

    /// Approvers offered to `submitter_id` when filing a request.
    pub async fn approvers_for(&self, submitter_id: u64) -> Result<Vec<Employee>, AppError> {
        let submitter = self
            .store
            .find_employee(submitter_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("employee {submitter_id}")))?;
        self.eligible_approvers(submitter.department.as_deref()).await
    }

    /// Unknown approver ids are simply invalid.
    pub async fn validate_assignment(
        &self,
        submitter_department: Option<&str>,
        approver_id: u64,
    ) -> Result<bool, AppError> {
        Ok(match self.store.find_employee(approver_id).await? {
            Some(approver) => validate_assignment(submitter_department, &approver),
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn admin(id: u64, name: &str, scope: Option<&str>) -> Employee {
        Employee {
            id,
            name: name.into(),
            department: scope.map(str::to_string),
            role: Role::Admin,
            managed_department: scope.map(str::to_string),
        }
    }

    fn staff(id: u64, dept: &str) -> Employee {
        Employee {
            id,
            name: format!("staff-{id}"),
            department: Some(dept.into()),
            role: Role::Staff,
            managed_department: None,
        }
    }

    #[test]
    fn department_admins_come_before_global_admins() {
        let admins = vec![
            admin(1, "Zed", None),
            admin(2, "Yui", Some("Nursing")),
            admin(3, "Abe", None),
            admin(4, "Kai", Some("Radiology")),
            admin(5, "Ann", Some("Nursing")),
        ];
        let ids: Vec<u64> = eligible_approvers(&admins, Some("Nursing"))
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![5, 2, 3, 1]);
    }

    #[test]
    fn submitter_without_department_only_gets_global_admins() {
        let admins = vec![admin(1, "Zed", None), admin(2, "Yui", Some("Nursing"))];
        let ids: Vec<u64> = eligible_approvers(&admins, None).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn assignment_rules() {
        assert!(validate_assignment(Some("Radiology"), &admin(1, "G", None)));
        assert!(validate_assignment(None, &admin(1, "G", None)));
        assert!(validate_assignment(Some("Nursing"), &admin(2, "N", Some("Nursing"))));
        assert!(!validate_assignment(Some("Radiology"), &admin(2, "N", Some("Nursing"))));
        assert!(!validate_assignment(Some("Nursing"), &staff(3, "Nursing")));
    }
}
