//! Job-dispatch engine library root: the module tree shared between the
//! binary and its test suite.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

/// Re-exports the pieces `main.rs` needs to boot the process, so the
/// binary doesn't reach three levels deep into the module tree.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::state::{AppState, Collaborators, SystemMode};
}
