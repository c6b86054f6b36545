//! Concrete adapter implementations of the port traits.

pub mod chart_svg;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod text_report;

#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
