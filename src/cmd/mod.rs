//! CLI command implementations.
//!
//! | Module    | Commands handled                   |
//! |-----------|------------------------------------|
//! | `run`     | `Run`                              |
//! | `status`  | `Status`                           |
//! | `verify`  | `Verify`                           |
//! | `config`  | `Config`                           |
//! | `setup`   | shared store/orchestrator wiring   |

pub mod config;
pub mod run;
pub mod setup;
pub mod status;
pub mod verify;

pub use config::cmd_config;
pub use run::cmd_run;
pub use status::cmd_status;
pub use verify::cmd_verify;
