//! Environment source: `SENTRY_BUFFER_DIR` -> `buffer.dir`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const DEFAULT_PREFIX: &str = "SENTRY";

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    prefix: &str,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(prefix)
            .prefix_separator("_")
            .separator("_"),
    )
}
