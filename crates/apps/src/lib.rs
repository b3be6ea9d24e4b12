//! Concrete apps for the AMI runtime: echo, ssh and browser.

pub mod browser;
pub mod echo;
pub mod ssh;

pub use browser::{BrowserApp, HttpPageFetcher, PageFetcher, DEFAULT_USER_AGENT};
pub use echo::{EchoApp, TextEffect};
pub use ssh::{CommandOutcome, CommandRunner, SshApp, SshCommandRunner, SshConfig};
