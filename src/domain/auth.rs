use serde::{Deserialize, Serialize};

/// Verified identity of the caller. Authentication itself happens upstream;
/// the engine only consumes the already-established identity and roles.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthenticatedUser {
    /// Identifier of the user record behind this identity.
    pub id: i32,
    /// Display name of the user.
    pub name: String,
    /// Email address of the user.
    pub email: String,
    /// Roles granted to this identity.
    pub roles: Vec<String>,
}

/// Returns true when `role` is among the caller's granted roles.
pub fn check_role(role: &str, roles: &[String]) -> bool {
    roles.iter().any(|granted| granted == role)
}
