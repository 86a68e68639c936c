/// Request authentication context
///
/// The API server's JWT middleware validates the Bearer token on each request
/// and inserts an `AuthContext` into request extensions. Handlers extract it
/// with Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::jwt::{Claims, TokenType};
/// use taskdeck_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
/// let ctx = AuthContext::from_claims(&claims);
/// assert_eq!(ctx.user_id, claims.sub);
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;

/// Authentication context added to request extensions after token validation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;

    #[test]
    fn test_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, TokenType::Access);

        let ctx = AuthContext::from_claims(&claims);
        assert_eq!(ctx.user_id, user_id);
    }
}
