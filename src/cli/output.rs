//! CLI output: presentation of resolved configuration and mapping of errors.

use super::parse::OutputFormat;
use crate::error::FactoryError;
use crate::event::Event;
use crate::factory::ResolvedConfiguration;
use crate::transport::TransportRejection;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &FactoryError) -> String {
    match e {
        FactoryError::UnsupportedTransport(TransportRejection::SynchronousMode { option }) => {
            format!("{}\nHint: drop '{}' from the DSN or configuration.", e, option)
        }
        _ => e.to_string(),
    }
}

pub fn format_resolved_configuration(
    resolved: &ResolvedConfiguration,
    format: OutputFormat,
) -> Result<String, FactoryError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(resolved)
            .map_err(|e| FactoryError::ConfigError(format!("Failed to render JSON: {}", e))),
        OutputFormat::Toml => toml::to_string_pretty(resolved)
            .map_err(|e| FactoryError::ConfigError(format!("Failed to render TOML: {}", e))),
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("DSN:             {}\n", resolved.dsn));
            out.push_str(&format!(
                "Transport:       {}{}\n",
                resolved.scheme,
                if resolved.is_inert() { " (inert)" } else { "" }
            ));
            match &resolved.buffer {
                Some(buffer) => out.push_str(&format!(
                    "Buffer:          {} (capacity {})\n",
                    buffer.path.display(),
                    buffer.capacity
                )),
                None => out.push_str("Buffer:          disabled\n"),
            }
            let in_app: Vec<&str> = resolved.in_app.iter().collect();
            out.push_str(&format!(
                "In-app:          {}\n",
                if in_app.is_empty() {
                    "<none>".to_string()
                } else {
                    in_app.join(", ")
                }
            ));
            out.push_str(&format!(
                "Context manager: {}\n",
                resolved.context_manager_strategy
            ));
            for advisory in &resolved.advisories {
                out.push_str(&format!("Warning:         {}\n", advisory));
            }
            Ok(out.trim_end().to_string())
        }
    }
}

pub fn format_buffered_events(events: &[Event], format: OutputFormat) -> Result<String, FactoryError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(events)
            .map_err(|e| FactoryError::ConfigError(format!("Failed to render JSON: {}", e))),
        OutputFormat::Toml | OutputFormat::Text => {
            if events.is_empty() {
                return Ok("No buffered events".to_string());
            }
            Ok(events
                .iter()
                .map(|e| {
                    format!(
                        "{}  {}  {:?}  {}",
                        e.event_id.simple(),
                        e.timestamp.to_rfc3339(),
                        e.level,
                        e.message
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}
