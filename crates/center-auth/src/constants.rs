//! Backend auth endpoints and client-side storage keys
//!
//! Paths are relative to the configured backend base URL.

/// Login endpoint: `{username, password}` in, `{access_token, username}` out
pub const LOGIN_PATH: &str = "/api/admin/login";

/// Token check endpoint: bearer token in, `{valid}` out
pub const VERIFY_PATH: &str = "/api/admin/verify";

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "admin_token";

/// Storage key for the admin username
pub const USERNAME_KEY: &str = "admin_username";

/// Route unauthenticated admin navigation is sent to
pub const LOGIN_ROUTE: &str = "/admin/login";

/// Reason shown when the backend rejects a login without a readable `detail`
pub const GENERIC_LOGIN_FAILURE: &str = "Login failed";
