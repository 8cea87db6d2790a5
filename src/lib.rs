//! Common functionality for the DOLPHYN results visualisation toolkit.
#![warn(missing_docs)]
pub mod analysis;
pub mod category;
pub mod cli;
pub mod log;
pub mod output;
pub mod plot;
pub mod reshape;
pub mod results;
pub mod settings;
pub mod table;

#[cfg(test)]
mod fixture;
