//! Authentication: OAuth 2.0 PKCE login flow, cookie sessions, and the
//! admin request guard.

pub mod current_admin;
pub mod oauth;
pub mod session;

pub use current_admin::CurrentAdmin;
