use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header::RETRY_AFTER, Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use crate::config::RetryPolicy;
use crate::domain::{
    models::{business::LocationRef, review::{ExternalReview, PostedReply}},
    ports::{CredentialStore, ReviewSource},
};
use crate::error::AppError;

const PAGE_SIZE: u32 = 50;
const RATE_LIMIT_MARKERS: [&str; 3] = ["RESOURCE_EXHAUSTED", "rateLimitExceeded", "userRateLimitExceeded"];

pub struct GbpClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewsPage {
    #[serde(default)]
    reviews: Vec<GbpReview>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbpReviewer {
    display_name: Option<String>,
    profile_photo_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbpReview {
    review_id: String,
    reviewer: Option<GbpReviewer>,
    star_rating: Option<Value>,
    comment: Option<String>,
    create_time: Option<DateTime<Utc>>,
    update_time: Option<DateTime<Utc>>,
}

impl GbpReview {
    fn into_external(self) -> ExternalReview {
        let (author_name, author_photo_url) = match self.reviewer {
            Some(r) => (r.display_name.unwrap_or_else(|| "Anonymous".to_string()), r.profile_photo_url),
            None => ("Anonymous".to_string(), None),
        };
        ExternalReview {
            external_review_id: self.review_id,
            author_name,
            author_photo_url,
            star_rating: self.star_rating.as_ref().and_then(parse_star_rating).unwrap_or(1),
            text: self.comment.unwrap_or_default(),
            created_at: self.create_time,
            updated_at: self.update_time,
        }
    }
}

// Accepts both the enum form (`"FOUR"`) and a plain number.
fn parse_star_rating(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().map(|n| n.clamp(1, 5) as i32),
        Value::String(s) => match s.as_str() {
            "ONE" => Some(1),
            "TWO" => Some(2),
            "THREE" => Some(3),
            "FOUR" => Some(4),
            "FIVE" => Some(5),
            other => other.parse::<i32>().ok().map(|n| n.clamp(1, 5)),
        },
        _ => None,
    }
}

fn is_rate_limited(status: StatusCode, body: &str) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_client_error() && RATE_LIMIT_MARKERS.iter().any(|m| body.contains(m)))
}

fn parse_reply(body: &Value) -> PostedReply {
    let timestamp = body.get("createTime")
        .or_else(|| body.get("updateTime"))
        .and_then(|t| t.as_str());
    let external_reply_id = body.get("name")
        .and_then(|n| n.as_str())
        .or(timestamp)
        .unwrap_or_default()
        .to_string();
    let published_at = timestamp
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    PostedReply { external_reply_id, published_at }
}

impl GbpClient {
    pub fn new(base_url: String, credentials: Arc<dyn CredentialStore>, retry: RetryPolicy) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            retry,
        }
    }

    /// Runs one logical request, retrying rate limits, 5xx and transport errors up to
    /// `max_attempts` calls in total. Other 4xx responses fail on the first call.
    async fn send_with_retry(&self, build: impl Fn() -> RequestBuilder) -> Result<Value, AppError> {
        let mut attempt = 0;
        let mut backoff = self.retry.initial_backoff;

        loop {
            attempt += 1;
            let mut retry_after = None;

            let failure = match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response.text().await.unwrap_or_default();
                        if text.trim().is_empty() {
                            return Ok(Value::Null);
                        }
                        return serde_json::from_str(&text).map_err(|e| {
                            error!("Failed to parse review platform response JSON: {:?}", e);
                            AppError::UpstreamRejected { status: status.as_u16(), message: "invalid JSON body".into() }
                        });
                    }

                    retry_after = response.headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse::<u64>().ok())
                        .map(Duration::from_secs);
                    let text = response.text().await.unwrap_or_default();

                    if is_rate_limited(status, &text) {
                        AppError::RateLimited { attempts: attempt }
                    } else if status.is_server_error() {
                        AppError::UpstreamRejected { status: status.as_u16(), message: text }
                    } else {
                        error!("Review platform terminal error {}: {}", status, text);
                        return Err(AppError::UpstreamRejected { status: status.as_u16(), message: text });
                    }
                }
                Err(e) => AppError::UpstreamRejected {
                    status: StatusCode::BAD_GATEWAY.as_u16(),
                    message: format!("transport error: {}", e),
                },
            };

            if attempt >= self.retry.max_attempts {
                error!("Review platform request failed after {} attempts: {}", attempt, failure);
                return Err(failure);
            }

            let wait = retry_after.unwrap_or(backoff).min(self.retry.max_backoff);
            warn!("Review platform transient failure ({}). Retrying in {}ms...", failure, wait.as_millis());
            sleep(wait).await;
            backoff = (backoff * 2).min(self.retry.max_backoff);
        }
    }
}

#[async_trait]
impl ReviewSource for GbpClient {
    #[instrument(skip(self), fields(location = %location.location_name))]
    async fn list_reviews(&self, tenant_id: &str, location: &LocationRef) -> Result<Vec<ExternalReview>, AppError> {
        let token = self.credentials.access_token(tenant_id).await?;
        let url = format!("{}{}", self.base_url, location.reviews_path());

        let mut reviews = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let body = self.send_with_retry(|| {
                let mut req = self.client.get(&url)
                    .bearer_auth(&token)
                    .query(&[("pageSize", PAGE_SIZE.to_string())]);
                if let Some(t) = &page_token {
                    req = req.query(&[("pageToken", t)]);
                }
                req
            }).await?;

            let page: ReviewsPage = if body.is_null() {
                ReviewsPage { reviews: Vec::new(), next_page_token: None }
            } else {
                serde_json::from_value(body).map_err(|e| AppError::UpstreamRejected {
                    status: StatusCode::OK.as_u16(),
                    message: format!("unexpected reviews payload: {}", e),
                })?
            };

            reviews.extend(page.reviews.into_iter().map(GbpReview::into_external));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        info!("Listed {} reviews", reviews.len());
        Ok(reviews)
    }

    #[instrument(skip(self, text), fields(location = %location.location_name))]
    async fn post_reply(
        &self,
        tenant_id: &str,
        location: &LocationRef,
        external_review_id: &str,
        text: &str,
    ) -> Result<PostedReply, AppError> {
        let token = self.credentials.access_token(tenant_id).await?;
        let url = format!("{}{}", self.base_url, location.replies_path(external_review_id));
        let payload = json!({ "comment": text });

        let body = self.send_with_retry(|| self.client.post(&url).bearer_auth(&token).json(&payload)).await?;
        let reply = parse_reply(&body);
        info!("Reply posted upstream as {}", reply.external_reply_id);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_star_rating_forms() {
        assert_eq!(parse_star_rating(&json!("FIVE")), Some(5));
        assert_eq!(parse_star_rating(&json!("TWO")), Some(2));
        assert_eq!(parse_star_rating(&json!(3)), Some(3));
        assert_eq!(parse_star_rating(&json!(9)), Some(5));
        assert_eq!(parse_star_rating(&json!("STAR_RATING_UNSPECIFIED")), None);
    }

    #[test]
    fn test_rate_limit_classification() {
        assert!(is_rate_limited(StatusCode::TOO_MANY_REQUESTS, ""));
        assert!(is_rate_limited(StatusCode::FORBIDDEN, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#));
        assert!(!is_rate_limited(StatusCode::BAD_REQUEST, r#"{"error":{"status":"INVALID_ARGUMENT"}}"#));
        assert!(!is_rate_limited(StatusCode::SERVICE_UNAVAILABLE, "RESOURCE_EXHAUSTED"));
    }

    #[test]
    fn test_parse_reply_id_fallbacks() {
        let named = parse_reply(&json!({ "name": "accounts/1/locations/2/reviews/3/reply", "createTime": "2025-03-01T10:00:00Z" }));
        assert_eq!(named.external_reply_id, "accounts/1/locations/2/reviews/3/reply");
        assert_eq!(named.published_at.to_rfc3339(), "2025-03-01T10:00:00+00:00");

        let unnamed = parse_reply(&json!({ "comment": "Thanks", "updateTime": "2025-03-02T08:30:00Z" }));
        assert_eq!(unnamed.external_reply_id, "2025-03-02T08:30:00Z");
    }
}
