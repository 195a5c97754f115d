//! Utilities shared by the Tabichat binaries and libraries.

pub mod logger;
pub mod time;
