//! pagegen navigation smoke tests
//!
//! Visits pages of a running pagegen site and checks that each shows the
//! content expected for its path:
//! - Spawns the web server as a subprocess, or targets a running one
//! - Parses declarative YAML test specs
//! - Drives either a plain HTTP context over the server-rendered pages or a
//!   real browser through Playwright
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Navigation Test Runner                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_server() -> ServerHandle                       │
//! │    ├── run_spec(spec) -> TestResult                         │
//! │    └── run_spec_in(&mut dyn BrowserContext, spec)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, description, tags, timeouts                    │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── expect_text { text, timeout_ms? }              │
//! │          ├── expect_no_text { text }                        │
//! │          ├── sleep { ms }                                   │
//! │          └── log { message }                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod dom;
pub mod error;
pub mod playwright;
pub mod runner;
pub mod server;
pub mod spec;
pub mod wait;

pub use browser::{BrowserContext, HttpBrowser};
pub use error::{E2eError, E2eResult, FailureKind};
pub use runner::{RunnerConfig, TestResult, TestRunner, TestSuiteResult};
pub use spec::{TestSpec, TestStep};
pub use wait::{Poller, WaitConfig};
