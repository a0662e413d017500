use serde::{Deserialize, Serialize};
use std::fmt;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Opaque identity of one accepted peer connection.
///
/// Never sent over the wire: the channel a message arrives on is what
/// binds it to a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_valid_uuid() {
        let id = new_id();
        let parsed = uuid::Uuid::parse_str(&id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn connection_ids_are_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn connection_id_display_matches_as_str() {
        let id = ConnectionId::new();
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn short_is_prefix() {
        let id = ConnectionId::new();
        assert_eq!(id.short().len(), 8);
        assert!(id.as_str().starts_with(id.short()));

        let tiny = ConnectionId::from("abc");
        assert_eq!(tiny.short(), "abc");
    }

    #[test]
    fn connection_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let a = ConnectionId::new();
        set.insert(a.clone());
        set.insert(a);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn connection_id_serialization() {
        let id = ConnectionId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
