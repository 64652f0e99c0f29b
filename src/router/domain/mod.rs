//! Domain types for the router's per-page state.

mod pages;

pub use pages::{PageDirectories, context_update};
