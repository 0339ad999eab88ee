//! Session capability.
//!
//! Token issuance lives with an external identity provider; the rest of
//! the crate only sees this trait.

/// Access to the signed-in user and their bearer token.
pub trait AuthProvider: Send + Sync {
    /// Id of the signed-in user, if any.
    fn current_user(&self) -> Option<String>;

    /// Bearer token for authenticated requests, if one is available.
    fn auth_token(&self) -> Option<String>;
}

/// Credentials supplied up front (config file, env or flags).
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user_id: Option<String>,
    token: Option<String>,
}

impl StaticAuth {
    pub fn new(user_id: Option<String>, token: Option<String>) -> Self {
        Self {
            user_id: non_blank(user_id),
            token: non_blank(token),
        }
    }

    /// No user signed in.
    #[cfg(test)]
    pub fn signed_out() -> Self {
        Self::default()
    }
}

impl AuthProvider for StaticAuth {
    fn current_user(&self) -> Option<String> {
        self.user_id.clone()
    }

    fn auth_token(&self) -> Option<String> {
        self.token.clone()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
