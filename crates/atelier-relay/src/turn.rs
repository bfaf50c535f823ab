use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn as supplied by the widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message exchange unit. Immutable once received; the relay never
/// persists these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// A turn as read back from the conversation store. The role label is kept
/// verbatim; the store is owned by an external writer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTurn {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_roles_use_lowercase_labels() {
        let json = serde_json::to_string(&ChatTurn::user("hi")).expect("encode");
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
        let back: ChatTurn =
            serde_json::from_str(r#"{"role":"assistant","content":"hello"}"#).expect("decode");
        assert_eq!(back.role, TurnRole::Assistant);
    }
}
