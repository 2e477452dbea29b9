pub mod ai;
pub mod auth;
pub mod brand;
pub mod business;
pub mod credential;
pub mod job;
pub mod notification;
pub mod response;
pub mod review;
pub mod subscription;
pub mod tenant;
pub mod usage;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
