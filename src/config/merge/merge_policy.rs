//! Merge rules: defaults, override order, conflict handling.
//!
//! Client options (`buffer.size`, `async`) get no defaults here; any value in a
//! layer shadows the DSN options tier.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
