pub mod config;
pub mod feed;
pub mod mpesa;
pub mod platform;
