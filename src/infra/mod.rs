pub mod ai;
pub mod email;
pub mod factory;
pub mod google;
pub mod notifications;
pub mod repositories;
