//! Integration test crate for Autoconform.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the conform crates to verify they work together.

#[cfg(test)]
mod conform;

#[cfg(test)]
mod database;
