//! Unit tests for the agent UI controller.

mod support;
