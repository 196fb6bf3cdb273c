use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller identity, attached to the request by the identity
/// middleware. Authentication itself happens upstream at the gateway; this
/// core only consumes the verified id and role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl User {
    pub fn is_doctor(&self) -> bool {
        self.role.as_deref() == Some("doctor")
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}
