pub mod converter;
pub mod docker;
pub mod error;
pub mod naming;
pub mod puller;
pub mod reconcile;
pub mod runtime;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use converter::*;
pub use docker::*;
pub use error::*;
pub use naming::*;
pub use puller::*;
pub use reconcile::*;
pub use runtime::*;
