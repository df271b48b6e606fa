use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::Unauthorized;

pub static BORROWER_HEADER: &str = "x-borrower-id";

/// Borrower identity resolved upstream and forwarded in `x-borrower-id`.
#[derive(Debug, Clone, Copy)]
pub struct Caller(Uuid);

impl Caller {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(BORROWER_HEADER)
            .ok_or_else(|| Unauthorized::new("missing x-borrower-id header"))?;
        value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(Caller)
            .ok_or_else(|| Unauthorized::new("x-borrower-id is not a valid id"))
    }
}
