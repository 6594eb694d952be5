//! Inbound transports. Only HTTP for now.

pub mod http;
