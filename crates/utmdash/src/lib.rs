//! # utmdash
//!
//! Command line front end for the UTM traffic dashboard: renders reports,
//! lists campaigns and manages the page-mapping table of the analytics
//! backend.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::*;
pub use commands::*;
pub use error::*;
