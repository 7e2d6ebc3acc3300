/// verbose のときだけ info、それ以外は debug で出す
macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod logs;
pub mod orchestrator;
pub mod settings;

pub use error::*;
pub use handler::*;
pub use lifecycle::*;
pub use logs::*;
pub use orchestrator::*;
pub use settings::*;
