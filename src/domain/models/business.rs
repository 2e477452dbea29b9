use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Business {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub gmb_account_id: Option<String>,
    pub gmb_location_id: Option<String>,
    pub gmb_location_name: Option<String>,
    pub is_active: bool,
    pub responses_published: i32,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRef {
    pub account_name: String,
    pub location_name: String,
}

impl LocationRef {
    pub fn new(account_id: &str, location_id: &str) -> Self {
        Self {
            account_name: format!("accounts/{}", account_id.trim_start_matches("accounts/")),
            location_name: format!("locations/{}", location_id.trim_start_matches("locations/")),
        }
    }

    pub fn reviews_path(&self) -> String {
        format!("/{}/{}/reviews", self.account_name, self.location_name)
    }

    pub fn replies_path(&self, external_review_id: &str) -> String {
        format!("{}/{}/replies", self.reviews_path(), external_review_id)
    }
}

impl Business {
    pub fn new(tenant_id: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            name,
            gmb_account_id: None,
            gmb_location_id: None,
            gmb_location_name: None,
            is_active: true,
            responses_published: 0,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn location_ref(&self) -> Option<LocationRef> {
        match (self.gmb_account_id.as_deref(), self.gmb_location_id.as_deref()) {
            (Some(account), Some(location)) if !account.is_empty() && !location.is_empty() => {
                Some(LocationRef::new(account, location))
            }
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.location_ref().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_ref_requires_both_ids() {
        let mut business = Business::new("t1".into(), "Cafe".into());
        assert!(business.location_ref().is_none());

        business.gmb_account_id = Some("123".into());
        assert!(!business.is_connected(), "Account id alone is not a connection");

        business.gmb_location_id = Some("locations/456".into());
        let location = business.location_ref().unwrap();
        assert_eq!(location.account_name, "accounts/123");
        assert_eq!(location.location_name, "locations/456");
        assert_eq!(location.replies_path("r1"), "/accounts/123/locations/456/reviews/r1/replies");
    }
}
