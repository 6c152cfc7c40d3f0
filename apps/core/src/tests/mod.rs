//! Test Module
//!
//! Test suite for the VahtaChat backend.
//!
//! ## Test Categories
//! - `brain_tests`: Template closure, rule priority, job search truncation
//! - `actor_tests`: Completion gateway over HTTP, shared mock gateway
//! - `supervisor_tests`: Ask pipeline and fallback policy
//! - `server_tests`: HTTP routes, CORS and error bodies
//! - `history_tests`: Bounded file-backed history

pub mod actor_tests;
