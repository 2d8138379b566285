//! Admin-side user directory.
//!
//! New accounts register unapproved; an administrator reviews them in
//! the admin panel and flips approval (or promotes to admin). This
//! module is the data side of that panel, against an abstract profile
//! store.

use tracing::debug;

use crate::gateway::GatewayError;
use crate::models::{Role, UserProfile};

/// Abstract store for account profile documents.
pub trait UserGateway {
    /// All profiles, in no particular order.
    async fn fetch_all(&self) -> Result<Vec<(String, UserProfile)>, GatewayError>;

    async fn set_approval(&self, uid: &str, approved: bool) -> Result<(), GatewayError>;

    async fn set_role(&self, uid: &str, role: Role) -> Result<(), GatewayError>;
}

/// Admin view over the account profiles.
pub struct UserDirectory<G> {
    gateway: G,
}

impl<G: UserGateway> UserDirectory<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Profiles with uid, pending approvals first, each group ordered
    /// by registration date.
    pub async fn list(&self) -> Result<Vec<(String, UserProfile)>, GatewayError> {
        let mut users = self.gateway.fetch_all().await?;
        users.sort_by(|(_, a), (_, b)| {
            a.is_approved
                .cmp(&b.is_approved)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(users)
    }

    /// Flip an account's approval. Returns the new approval state.
    pub async fn toggle_approval(
        &self,
        uid: &str,
        currently_approved: bool,
    ) -> Result<bool, GatewayError> {
        let approved = !currently_approved;
        self.gateway.set_approval(uid, approved).await?;
        debug!(uid, approved, "Approval toggled");
        Ok(approved)
    }

    /// Switch an account between admin and plain user. Returns the new
    /// role.
    pub async fn toggle_role(&self, uid: &str, current: Role) -> Result<Role, GatewayError> {
        let role = current.toggled();
        self.gateway.set_role(uid, role).await?;
        debug!(uid, role = %role, "Role changed");
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use chrono::{TimeZone, Utc};

    use super::*;

    struct MemoryUsers {
        profiles: RefCell<HashMap<String, UserProfile>>,
    }

    impl MemoryUsers {
        fn new(profiles: Vec<(&str, UserProfile)>) -> Self {
            Self {
                profiles: RefCell::new(
                    profiles
                        .into_iter()
                        .map(|(uid, p)| (uid.to_string(), p))
                        .collect(),
                ),
            }
        }
    }

    impl UserGateway for &MemoryUsers {
        async fn fetch_all(&self) -> Result<Vec<(String, UserProfile)>, GatewayError> {
            Ok(self
                .profiles
                .borrow()
                .iter()
                .map(|(uid, p)| (uid.clone(), p.clone()))
                .collect())
        }

        async fn set_approval(&self, uid: &str, approved: bool) -> Result<(), GatewayError> {
            match self.profiles.borrow_mut().get_mut(uid) {
                Some(p) => {
                    p.is_approved = approved;
                    Ok(())
                }
                None => Err(GatewayError::Update {
                    id: uid.to_string(),
                    reason: "profile not found".to_string(),
                }),
            }
        }

        async fn set_role(&self, uid: &str, role: Role) -> Result<(), GatewayError> {
            match self.profiles.borrow_mut().get_mut(uid) {
                Some(p) => {
                    p.role = role;
                    Ok(())
                }
                None => Err(GatewayError::Update {
                    id: uid.to_string(),
                    reason: "profile not found".to_string(),
                }),
            }
        }
    }

    fn profile(email: &str, approved: bool, day: u32) -> UserProfile {
        UserProfile {
            email: email.to_string(),
            is_approved: approved,
            role: Role::User,
            created_at: Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).single().expect("date"),
        }
    }

    #[tokio::test]
    async fn test_list_puts_pending_accounts_first() {
        let store = MemoryUsers::new(vec![
            ("a", profile("old-approved@x.mg", true, 1)),
            ("b", profile("new-pending@x.mg", false, 20)),
            ("c", profile("old-pending@x.mg", false, 5)),
        ]);
        let directory = UserDirectory::new(&store);

        let listed = directory.list().await.expect("list");
        let uids: Vec<&str> = listed.iter().map(|(uid, _)| uid.as_str()).collect();
        assert_eq!(uids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_toggle_approval_round_trip() {
        let store = MemoryUsers::new(vec![("a", profile("p@x.mg", false, 1))]);
        let directory = UserDirectory::new(&store);

        assert!(directory.toggle_approval("a", false).await.expect("approve"));
        assert!(store.profiles.borrow()["a"].is_approved);
        assert!(!directory.toggle_approval("a", true).await.expect("revoke"));
        assert!(!store.profiles.borrow()["a"].is_approved);
    }

    #[tokio::test]
    async fn test_toggle_role_promotes_and_demotes() {
        let store = MemoryUsers::new(vec![("a", profile("p@x.mg", true, 1))]);
        let directory = UserDirectory::new(&store);

        assert_eq!(directory.toggle_role("a", Role::User).await.expect("promote"), Role::Admin);
        assert_eq!(store.profiles.borrow()["a"].role, Role::Admin);
    }

    #[tokio::test]
    async fn test_toggle_missing_profile_fails() {
        let store = MemoryUsers::new(vec![]);
        let directory = UserDirectory::new(&store);
        let err = directory
            .toggle_approval("ghost", false)
            .await
            .expect_err("missing profile");
        assert!(matches!(err, GatewayError::Update { .. }));
    }
}
