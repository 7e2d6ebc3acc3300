pub mod discovery;
pub mod error;
pub mod loader;
pub mod model;

pub use discovery::*;
pub use error::*;
pub use loader::*;
pub use model::*;
