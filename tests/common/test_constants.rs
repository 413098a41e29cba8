//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// Token sent by test clients as `X-Auth-Token`.
pub const AUTH_TOKEN: &str = "gAAAAABtest-token";

/// Project scope used by test clients.
pub const PROJECT_ID: &str = "8f1c0a2d4b6e4f7a9c3d5e7f9a1b3c5d";
