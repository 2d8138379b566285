use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role stored alongside the user profile document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// The role an admin toggle switches to.
    pub fn toggled(self) -> Self {
        match self {
            Role::Admin => Role::User,
            Role::User => Role::Admin,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

/// Per-account profile document in the `users` collection.
///
/// New registrations start unapproved; an admin flips `is_approved`
/// before the account can reach the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(rename = "isApproved", default)]
    pub is_approved: bool,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Profile for a freshly registered account.
    pub fn new_registration(email: &str) -> Self {
        Self {
            email: email.to_string(),
            is_approved: false,
            role: Role::User,
            created_at: Utc::now(),
        }
    }
}

/// The identity-provider view of an account plus the authorization
/// fields derived from its profile document, composed explicitly and
/// rebuilt whole on every profile update.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
    pub is_approved: bool,
    pub role: Role,
}

impl AuthUser {
    /// Compose the provider identity with its profile. A missing profile
    /// (document not yet written) yields an unapproved plain user.
    pub fn compose(
        uid: &str,
        email: &str,
        email_verified: bool,
        profile: Option<&UserProfile>,
    ) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.to_string(),
            email_verified,
            is_approved: profile.is_some_and(|p| p.is_approved),
            role: profile.map(|p| p.role).unwrap_or_default(),
        }
    }

    /// Whether this account may access the registry at all.
    pub fn can_access(&self) -> bool {
        self.email_verified && self.is_approved
    }
}
