use serde::{Deserialize, Serialize};

/// The authenticated user record.
///
/// Persisted alongside the bearer token and exposed to route guards through
/// the session controller's read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl User {
    /// Check whether the user carries the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
