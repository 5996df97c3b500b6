//! Migrate workflow.
//!
//! Init -> ResolveBothControllerIds -> (ApplicationConfig | Unimplemented)
//! -> Done. Account-level migration and unknown entity names fail before
//! any network call. Applications are paired by exact name; a source
//! application without a destination twin is skipped with a warning.

use tracing::{info, warn};

use appdx_api::MigrationRequest;

use crate::context::Context;
use crate::entity::{ConfigEntity, resolve_migration_entities};
use crate::error::CoreError;
use crate::settings::Settings;

/// Outcome of a migration run that reached Done. Entries are source
/// application names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: Vec<String>,
    /// No destination application with the same name.
    pub skipped: Vec<String>,
    /// The exporter rejected the request.
    pub failed: Vec<String>,
}

/// The per-run part of a [`MigrationRequest`]; application ids are filled
/// in per source application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTemplate {
    source_controller_id: u64,
    dest_controller_id: u64,
    config_entities: Vec<String>,
    overwrite: bool,
    create_tier: bool,
}

impl MigrationTemplate {
    pub fn new(
        source_controller_id: u64,
        dest_controller_id: u64,
        entities: &[ConfigEntity],
        settings: &Settings,
    ) -> Self {
        Self {
            source_controller_id,
            dest_controller_id,
            config_entities: entities
                .iter()
                .map(|e| e.migration_id().to_owned())
                .collect(),
            overwrite: settings.overwrite,
            create_tier: settings.create_tier,
        }
    }

    pub fn instantiate(&self, source_application_id: u64, dest_application_id: u64) -> MigrationRequest {
        MigrationRequest {
            source_controller_id: self.source_controller_id,
            dest_controller_id: self.dest_controller_id,
            source_application_id,
            dest_application_id,
            config_entities: self.config_entities.clone(),
            overwrite: self.overwrite,
            create_tier: self.create_tier,
        }
    }
}

pub async fn run_migrate(ctx: &Context<'_>) -> Result<MigrationReport, CoreError> {
    let settings = ctx.settings;
    let mut report = MigrationReport::default();

    if !settings.account_config.is_empty() {
        return Err(CoreError::NotImplemented {
            feature: "Account-level migration".into(),
        });
    }
    let entities = resolve_migration_entities(&settings.application_config)?;
    let destination = settings.destination.as_ref().ok_or_else(|| CoreError::Config {
        message: "migrate mode needs destination controller settings".into(),
    })?;

    let source_id = ctx.resolve_controller_id(&settings.source.url).await?;
    let dest_id = ctx.resolve_controller_id(&destination.url).await?;

    if entities.is_empty() {
        info!("no application-level entities configured; nothing to migrate");
        return Ok(report);
    }

    let template = MigrationTemplate::new(source_id, dest_id, &entities, settings);
    let source_apps = ctx
        .applications(source_id, &settings.application_filter)
        .await?;
    let dest_apps = ctx
        .applications(dest_id, &settings.application_filter)
        .await?;
    info!(
        source = source_apps.len(),
        destination = dest_apps.len(),
        entities = entities.len(),
        "starting migration"
    );

    for app in &source_apps {
        let Some(dest_app) = dest_apps.find_by_name(&app.name) else {
            warn!(
                application = %app.name,
                create_app = settings.create_app,
                "no application with this name on the destination controller, please create the application first"
            );
            report.skipped.push(app.name.clone());
            continue;
        };

        let request = template.instantiate(app.id, dest_app.id);
        match ctx.exporter.post_app_config(&request).await {
            Ok(_) => {
                info!(
                    application = %app.name,
                    source_id = app.id,
                    dest_id = dest_app.id,
                    "migrated"
                );
                report.migrated.push(app.name.clone());
            }
            Err(e) => {
                warn!(application = %app.name, "migration request failed: {e}");
                report.failed.push(app.name.clone());
            }
        }
    }

    Ok(report)
}
