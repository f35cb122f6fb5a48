//! CLI command implementations.

pub mod init;
pub mod list;
pub mod run;
pub mod validate;
pub mod watch;
