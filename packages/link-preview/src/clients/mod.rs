//! Network client implementations.
//!
//! Available clients:
//! - `ReqwestHttpClient` - production [`HttpClient`](crate::traits::http::HttpClient) over `reqwest`

pub mod http;

pub use http::ReqwestHttpClient;
