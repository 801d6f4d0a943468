//! Census of INDI driver packaging versions on GitHub and Salsa.
pub mod changelog;
pub mod cli;
pub mod command;
pub mod error;
pub mod forge;
pub mod http;
pub mod ignore;
pub mod record;
pub mod report;
pub mod scanner;

pub use cli::Args;
pub use error::{CensusError, Result};
pub use record::PackageRecord;
