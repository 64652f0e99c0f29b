//! Unit tests for the per-page relay.

mod relay_tests;
