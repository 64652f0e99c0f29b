//! Unit tests for the wire protocol.

mod envelope_tests;
