use crate::domain::models::notification::DigestFrequency;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateBusinessRequest {
    pub name: String,
    pub gmb_account_id: Option<String>,
    pub gmb_location_id: Option<String>,
    pub gmb_location_name: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateConnectionRequest {
    pub gmb_account_id: String,
    pub gmb_location_id: String,
    pub gmb_location_name: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBrandSettingsRequest {
    pub tone: Option<String>,
    pub greeting: Option<String>,
    pub closing: Option<String>,
    pub response_length: Option<String>,
    pub include_coupon: Option<bool>,
    pub coupon_code: Option<String>,
    pub auto_publish: Option<bool>,
    pub notify_on_negative: Option<bool>,
}

#[derive(Deserialize)]
pub struct ListReviewsQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct EditResponseRequest {
    pub content: String,
    // The version the client edited from; a newer row yields 409.
    pub expected_version: Option<i32>,
}

#[derive(Deserialize)]
pub struct RejectResponseRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct UpdateNotificationPreferencesRequest {
    pub email: Option<String>,
    pub email_enabled: Option<bool>,
    pub email_for_new_reviews: Option<bool>,
    pub email_for_negative_reviews: Option<bool>,
    pub email_digest: Option<DigestFrequency>,
    pub digest_send_day: Option<i32>,
}
