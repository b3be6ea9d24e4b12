//! Transport adapters for the AMI runtime.

pub mod openai_compatible;

pub use openai_compatible::OpenAiCompatibleTransport;
