//! Credential handling and SSRF protection.

pub mod credentials;
pub mod url_guard;

pub use credentials::ApiKey;
pub use url_guard::UrlGuard;
