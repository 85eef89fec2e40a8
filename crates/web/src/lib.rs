//! pagegen Web Server
//!
//! Serves an HTML page for any path, filling its main region with content
//! generated for that path and cached on disk.

pub mod generator;
pub mod prompt;
pub mod server;
pub mod shell;

pub use generator::{ContentGenerator, GenerateError, LlmBackend, LlmGenerator, RuleBasedGenerator};
pub use server::{WebServer, WebServerConfig};
