//! Unit tests for the router.

mod store_failure_tests;
mod support;
