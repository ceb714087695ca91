use stockflow_core::UserId;

/// Authenticated buyer for an order-service request.
///
/// Set by [`crate::middleware::user_context_middleware`] from the `X-User-Id`
/// header that the upstream gateway adds after authenticating the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UserContext {
    user_id: UserId,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
