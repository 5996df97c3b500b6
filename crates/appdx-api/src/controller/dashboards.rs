// Controller dashboard endpoints (UI API)

use reqwest::Method;
use tracing::debug;

use crate::controller::client::ControllerClient;
use crate::error::Error;
use crate::transport::{decode, read_text};

const DASHBOARD_LIST_PATH: &str = "/controller/restui/dashboards/getAllDashboardsByType/false";

/// Raw dashboard listing as the controller returned it.
///
/// The status is kept rather than turned into an error so callers can
/// treat the listing as a transcript that ends in the HTTP status code.
#[derive(Debug, Clone)]
pub struct DashboardListing {
    pub status: u16,
    /// Dashboard objects (`{id, name, ...}`); empty unless the status was 2xx.
    pub rows: Vec<serde_json::Value>,
}

impl ControllerClient {
    /// List every custom dashboard visible to the session (authenticated).
    ///
    /// `GET /controller/restui/dashboards/getAllDashboardsByType/false`
    pub async fn list_dashboards(&self) -> Result<DashboardListing, Error> {
        let resp = self
            .request(true, Method::GET, DASHBOARD_LIST_PATH)?
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%status, "dashboard listing refused");
            return Ok(DashboardListing {
                status: status.as_u16(),
                rows: Vec::new(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let rows: Vec<serde_json::Value> = decode(&body)?;
        debug!(count = rows.len(), "dashboards listed");
        Ok(DashboardListing {
            status: status.as_u16(),
            rows,
        })
    }

    /// Download one dashboard definition through the import/export servlet.
    ///
    /// `GET /controller/CustomDashboardImportExportServlet?dashboardId={id}`
    pub async fn export_dashboard(&self, dashboard_id: u64) -> Result<String, Error> {
        let path = format!("/controller/CustomDashboardImportExportServlet?dashboardId={dashboard_id}");
        let resp = self
            .request(true, Method::GET, &path)?
            .send()
            .await
            .map_err(Error::Transport)?;
        read_text(resp).await
    }
}
