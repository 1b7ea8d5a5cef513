// ABOUTME: Supervisor hand-off module.
// ABOUTME: Builds the supervisor invocation and performs the terminal exec.

mod exec;

pub use exec::SupervisorCommand;
