//! CLI domain: parse, route and output only.
//! No domain orchestration; the route table dispatches to the factory.

mod output;
mod parse;
mod route;

pub use output::{format_buffered_events, format_resolved_configuration, map_error};
pub use parse::{Cli, Commands, OutputFormat};
pub use route::RunContext;
