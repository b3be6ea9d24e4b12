//! Human-facing interfaces for the AMI runtime.

pub mod terminal;

pub use terminal::TerminalGate;
