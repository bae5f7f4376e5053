pub mod env_vars;
pub mod filesystem;
pub mod paths;

pub use env_vars::*;
pub use filesystem::*;
pub use paths::*;
