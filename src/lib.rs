// Library surface for the binary, headless integration tests and reuse.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod expr;
pub mod game;
pub mod logging;
pub mod pool;
pub mod runtime;
pub mod scoring;
pub mod targets;

pub use error::{ConfigError, ExprError, PoolError};
pub use expr::{evaluate, tokenize, Token};
pub use game::{GameSession, Outcome, Phase, SessionDelta};
pub use pool::{NumberPool, NumberState};
