// appdx-core: export and migration workflows over the exporter and controller APIs

pub mod context;
pub mod entity;
pub mod entity_list;
pub mod error;
pub mod export;
pub mod migrate;
pub mod output;
pub mod settings;

pub use context::Context;
pub use entity::{AccountEntity, ConfigEntity, MonitoringApp};
pub use entity_list::{EntityInfo, EntityList, ParseError};
pub use error::CoreError;
pub use export::{ExportReport, run_export, run_export_at};
pub use migrate::{MigrationReport, MigrationTemplate, run_migrate};
pub use settings::{ApiSecret, ControllerSettings, Mode, Settings};
