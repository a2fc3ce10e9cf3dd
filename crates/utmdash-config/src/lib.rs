//! # utmdash config
//!
//! Configuration schema, loading and validation for utmdash.
//!
//! Settings come from a TOML or YAML file, are overridden by `UTMDASH_*`
//! environment variables and are validated before use.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use defaults::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
