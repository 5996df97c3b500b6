//! Export workflow.
//!
//! Init -> AuthIfNeeded -> ResolveControllerId -> ExportApplications ->
//! ExportAccount -> Done. Only the steps that leave nothing to do are
//! fatal: output directory creation, controller id resolution, the main
//! application listing, and file writes. Everything finer-grained is a
//! warning and the run continues.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::context::Context;
use crate::entity::AccountEntity;
use crate::entity_list::{EntityInfo, EntityList, flatten_rows, parse_entities};
use crate::error::CoreError;
use crate::output::{OutputTree, timestamp_now};

/// Placeholder the exporter accepts in place of an application id.
const ACCOUNT_PLACEHOLDER: &str = "account";

/// Marker every successful exporter document contains.
const CONTENT_MARKER: &str = "controllerUrl";

/// Outcome of an export run that reached Done.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub root: PathBuf,
    pub written: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl ExportReport {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// Run an export into `<output_dir>/<now>/`.
pub async fn run_export(ctx: &Context<'_>) -> Result<ExportReport, CoreError> {
    run_export_at(ctx, &timestamp_now()).await
}

/// Run an export into `<output_dir>/<timestamp>/`.
pub async fn run_export_at(ctx: &Context<'_>, timestamp: &str) -> Result<ExportReport, CoreError> {
    let settings = ctx.settings;

    let tree = OutputTree::create(&settings.output_dir, timestamp)?;
    let mut report = ExportReport {
        root: tree.root().to_path_buf(),
        ..ExportReport::default()
    };
    info!(root = %tree.root().display(), "starting export");

    if settings.wants_dashboards() {
        match ctx.source.authenticate().await {
            Ok(outcome) => debug!(?outcome, "source session authenticated"),
            Err(e) => report.warn(format!("source authentication failed, continuing: {e}")),
        }
    }

    let controller_id = ctx.resolve_controller_id(&settings.source.url).await?;

    if !settings.application_config.is_empty() {
        let apps = ctx
            .applications(controller_id, &settings.application_filter)
            .await?;
        if apps.is_empty() {
            report.warn(format!(
                "no applications match '{}'",
                settings.application_filter
            ));
        }
        export_applications(
            ctx,
            &tree,
            controller_id,
            &apps,
            settings.application_config.as_slice(),
            &mut report,
        )
        .await?;
    }

    for name in &settings.account_config {
        match AccountEntity::parse(name) {
            AccountEntity::Generic(entity) => {
                export_account_entity(ctx, &tree, controller_id, &entity, &mut report).await?;
            }
            AccountEntity::Monitoring(product) => {
                let filter = product.application_filter()?;
                match ctx.applications(controller_id, &filter).await {
                    Ok(apps) if apps.is_empty() => report.warn(format!(
                        "{product}: no application matches '{}'",
                        product.application_pattern()
                    )),
                    Ok(apps) => {
                        export_applications(
                            ctx,
                            &tree,
                            controller_id,
                            &apps,
                            product.entities(),
                            &mut report,
                        )
                        .await?;
                    }
                    Err(e) => report.warn(format!("{product}: application lookup failed: {e}")),
                }
            }
            AccountEntity::Dashboards => export_dashboards(ctx, &tree, &mut report).await?,
        }
    }

    info!(
        written = report.written.len(),
        warnings = report.warnings.len(),
        "export finished"
    );
    Ok(report)
}

async fn export_applications<S: AsRef<str> + Sync>(
    ctx: &Context<'_>,
    tree: &OutputTree,
    controller_id: u64,
    apps: &EntityList,
    entities: &[S],
    report: &mut ExportReport,
) -> Result<(), CoreError> {
    for app in apps {
        info!(application = %app.name, id = app.id, "exporting application");
        for entity in entities {
            export_application_entity(ctx, tree, controller_id, app, entity.as_ref(), report)
                .await?;
        }
    }
    Ok(())
}

async fn export_application_entity(
    ctx: &Context<'_>,
    tree: &OutputTree,
    controller_id: u64,
    app: &EntityInfo,
    entity: &str,
    report: &mut ExportReport,
) -> Result<(), CoreError> {
    let body = match ctx
        .exporter
        .fetch_entity(controller_id, entity, &app.id.to_string())
        .await
    {
        Ok(body) => body,
        Err(e) => {
            report.warn(format!("{}/{entity}: fetch failed: {e}", app.name));
            return Ok(());
        }
    };

    let path = tree.write_application_entity(app, entity, &body)?;
    check_content(&body, &format!("{}/{entity}", app.name), report);
    report.written.push(path);
    Ok(())
}

async fn export_account_entity(
    ctx: &Context<'_>,
    tree: &OutputTree,
    controller_id: u64,
    entity: &str,
    report: &mut ExportReport,
) -> Result<(), CoreError> {
    info!(entity, "exporting account entity");
    let body = match ctx
        .exporter
        .fetch_entity(controller_id, entity, ACCOUNT_PLACEHOLDER)
        .await
    {
        Ok(body) => body,
        Err(e) => {
            report.warn(format!("account/{entity}: fetch failed: {e}"));
            return Ok(());
        }
    };

    let path = tree.write_account_entity(entity, &body)?;
    check_content(&body, &format!("account/{entity}"), report);
    report.written.push(path);
    Ok(())
}

/// Dashboard files are written without content validation.
async fn export_dashboards(
    ctx: &Context<'_>,
    tree: &OutputTree,
    report: &mut ExportReport,
) -> Result<(), CoreError> {
    let listing = match ctx.source.list_dashboards().await {
        Ok(listing) => listing,
        Err(e) => {
            report.warn(format!("dashboard listing failed: {e}"));
            return Ok(());
        }
    };

    let mut lines = flatten_rows(&listing.rows, &ctx.settings.dashboard_filter);
    lines.push(listing.status.to_string());
    let dashboards = match parse_entities(&lines, true) {
        Ok(dashboards) => dashboards,
        Err(e) => {
            report.warn(format!("dashboard listing unusable: {e}"));
            return Ok(());
        }
    };
    info!(count = dashboards.len(), "exporting dashboards");

    for dashboard in &dashboards {
        match ctx.source.export_dashboard(dashboard.id).await {
            Ok(body) => {
                let path = tree.write_dashboard(dashboard, &body)?;
                report.written.push(path);
            }
            Err(e) => report.warn(format!("dashboard '{}': export failed: {e}", dashboard.name)),
        }
    }
    Ok(())
}

fn check_content(body: &str, label: &str, report: &mut ExportReport) {
    if !body.contains(CONTENT_MARKER) {
        report.warn(format!(
            "{label}: exported document has no {CONTENT_MARKER}; the export probably failed"
        ));
    }
}
