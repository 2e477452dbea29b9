use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,

    #[serde(rename = "https://reviews.app/claims/tenant_id")]
    pub tenant_id: String,

    // Present for browser sessions; mutating requests must echo it in `X-CSRF-Token`.
    #[serde(rename = "https://reviews.app/claims/csrf", default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub tenant_id: String,
}
