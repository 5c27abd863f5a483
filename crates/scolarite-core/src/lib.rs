//! Core types and trait definitions for the Scolarité student-records
//! service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod academic_year;
pub mod enrollment;
pub mod error;
pub mod history;
pub mod matricule;
pub mod store;
pub mod student;
pub mod transition;

pub use academic_year::AcademicYear;
pub use error::{Error, Result};
