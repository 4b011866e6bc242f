//! Router Module Index
//!
//! Routing split by access level, so each group gets its access control
//! applied explicitly where it is mounted.

/// Routes open to anonymous callers.
pub mod public;

/// Routes behind the `AuthUser` middleware. Requires a valid session token.
pub mod authenticated;

/// Routes restricted to the ADMINISTRATOR role.
pub mod admin;
