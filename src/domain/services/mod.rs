pub mod digest_service;
pub mod notification_service;
pub mod quota;
pub mod response_generator;
pub mod response_lifecycle;
pub mod review_sync;
