//! Unit tests for the capability domain.

mod directory_tests;
