//! Access grantee adapters.
//!
//! Implementations of the `AccessGrantee` port.

mod http_grantee;

pub use http_grantee::HttpAccessGrantee;
