//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init`, `verify`, `watch` |
//! | Task | Work item management | `task add`, `task list`, `task status` |
//! | Dep | Dependency edges | `dep add`, `dep rm`, `dep check` |
//! | Query | Graph state queries | `ready`, `blocked`, `levels`, `show` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The default can be changed with `default_format` in the global config.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logs on stderr:
//! ```bash
//! taskdag --verbose ready
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod dep;
mod output;
mod query;
mod task;
mod watch;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
