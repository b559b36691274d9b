//! Core domain types and logic.

pub mod matrix;
pub mod window;
pub mod trade;
pub mod history;
pub mod strategy;
pub mod runner;
pub mod universe;
pub mod config_validation;
pub mod error;
