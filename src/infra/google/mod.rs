pub mod gbp_client;
pub mod oauth_store;
