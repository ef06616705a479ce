use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// A member of the group, as identified by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub uid: UserId,
    pub username: String,
}

impl User {
    pub fn new(uid: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            uid: UserId::new(uid),
            username: username.into(),
        }
    }
}
