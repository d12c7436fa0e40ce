use super::error::LibraryError;

/// An authenticated user. Every library operation takes one explicitly; the
/// user id namespaces both blob paths and metadata records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    /// The id ends up as a directory name, so only `[A-Za-z0-9_-]` is allowed
    pub fn new(user_id: impl Into<String>) -> Result<Self, LibraryError> {
        let user_id = user_id.into();
        let valid = !user_id.is_empty()
            && user_id.len() <= 128
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(LibraryError::InvalidSession(user_id));
        }
        Ok(Session { user_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}
