//! Configuration for Courier clients.
//!
//! Settings live in `.courier/config.yaml`. Values may reference the
//! environment as `${VAR}` or `${VAR:-default}`, and `COURIER_*` variables
//! override the file after it is read.

pub mod env;
pub mod loader;
pub mod types;

pub use env::*;
pub use loader::*;
pub use types::*;
