//! The acting user, as seen by the edit service.

use curio_core::types::Id;
use curio_db::models::user::roles;

/// Identity plus granted roles, resolved by the caller before invoking
/// the service.
#[derive(Debug, Clone)]
pub struct EditUser {
    pub id: Id,
    pub roles: Vec<String>,
}

impl EditUser {
    pub fn new(id: Id, roles: Vec<String>) -> Self {
        Self { id, roles }
    }

    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(roles::ADMIN)
    }

    pub fn can_vote(&self) -> bool {
        self.has_role(roles::VOTE) || self.is_admin()
    }

    pub fn can_edit(&self) -> bool {
        self.has_role(roles::EDIT) || self.is_admin()
    }

    pub fn can_submit_as_bot(&self) -> bool {
        self.has_role(roles::BOT) || self.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_core::types::new_id;

    #[test]
    fn admin_implies_vote_and_edit() {
        let user = EditUser::new(new_id(), vec![roles::ADMIN.to_string()]);
        assert!(user.can_vote());
        assert!(user.can_edit());
        assert!(user.can_submit_as_bot());
    }

    #[test]
    fn plain_user_has_no_privileges() {
        let user = EditUser::new(new_id(), vec![roles::READ.to_string()]);
        assert!(!user.can_vote());
        assert!(!user.can_edit());
        assert!(!user.is_admin());
    }
}
