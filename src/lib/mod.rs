//! Shared library modules providing error types, path helpers, Python command builders, and telemetry initialization.

pub mod errors;
pub mod paths;
pub mod python;
pub mod signals;
pub mod telemetry;
