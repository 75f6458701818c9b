//! Shared setup code for the OMS host binaries

pub mod common;
