//! M-PESA (Daraja) API integration.

pub mod client;

pub use client::DarajaClient;
