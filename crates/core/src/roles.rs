//! User roles issued by the auth collaborator.

use crate::enums::define_text_enum;

define_text_enum! {
    /// Role carried in the access token.
    Role("role") {
        User = "user",
        Coach = "coach",
        Admin = "admin",
    }
}

impl Role {
    /// Coaches and admins may run coach-facing operations.
    pub fn can_coach(self) -> bool {
        matches!(self, Role::Coach | Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles() {
        assert_eq!("coach".parse::<Role>().unwrap(), Role::Coach);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn rejects_unknown_role() {
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn only_coach_and_admin_can_coach() {
        assert!(!Role::User.can_coach());
        assert!(Role::Coach.can_coach());
        assert!(Role::Admin.can_coach());
    }
}
