pub mod catalog;
pub mod config;
pub mod config_store;
pub mod locator;
pub mod logging;
pub mod runner;
pub mod shims;

pub use catalog::*;
pub use config::*;
pub use config_store::*;
pub use locator::*;
pub use logging::*;
pub use runner::*;
pub use shims::*;
