//! Clean Proxy - SOCKS5 Proxy Fraud Checker
//!
//! Vets SOCKS5 proxies by resolving the public IP each one egresses from
//! and scoring that IP against a fraud database. Proxies whose exit IP
//! scores zero are kept, everything else is dropped.

pub mod proxy;

pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
