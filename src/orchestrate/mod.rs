/// Render job lifecycle and artifact guards.
pub mod job;
/// Pipeline discovery and search path handling.
pub mod locate;
/// The request-level coordinator.
pub mod orchestrator;
/// Child process execution with a timeout.
pub mod process;
