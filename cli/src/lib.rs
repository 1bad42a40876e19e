//! localci CLI library; modules are exposed for tests.

pub mod app;
pub mod commands;
