pub mod brand;
pub mod business;
pub mod cron;
pub mod health;
pub mod notification;
pub mod response;
pub mod review;
pub mod usage;
