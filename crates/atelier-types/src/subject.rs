use serde::{Deserialize, Serialize};

use crate::id::Id;

/// The authenticated principal a verified session resolves to.
///
/// Verification is external; this type only carries what the gate needs to
/// key the role lookup and to log denials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: Id,
    #[serde(default)]
    pub email: Option<String>,
}

impl Subject {
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: Id(subject_id.into()),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
