//! S3 REST adapter: connection settings, request signing and XML bodies.

pub mod client;
pub mod config;
pub mod signing;
pub mod xml;

pub use client::S3Client;
pub use config::{ConnectionConfig, ProxyConfig, ProxySettings, ProxyType, DEFAULT_REGION};
