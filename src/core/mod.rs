pub mod constants;
pub mod context;
pub mod dispatcher;
pub mod resolver;
pub mod router;
pub mod version;

pub use context::*;
pub use dispatcher::*;
pub use resolver::*;
pub use router::*;
pub use version::*;
