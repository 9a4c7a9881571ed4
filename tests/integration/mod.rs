//! Integration tests for host-aware client construction

mod buffer_integration;
mod factory_end_to_end;
mod host_lifecycle;
mod in_app_properties;
mod test_utils;
