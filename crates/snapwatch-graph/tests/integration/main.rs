//! Integration tests for snapwatch-graph
//!
//! Uses wiremock to simulate the Microsoft Graph API and the identity
//! platform token endpoints.

mod common;

mod test_auth;
mod test_listing;
