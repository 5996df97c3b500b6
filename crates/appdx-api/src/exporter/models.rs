// Config Exporter wire types

use serde::{Deserialize, Serialize};

/// A controller registered with the exporter service.
///
/// `GET /api/controllers` returns a list of these; extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegisteredController {
    pub id: u64,
    pub url: String,
}

/// Body of `POST /api/rest/app-config`: copy configuration entities from one
/// application to another, possibly across controllers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRequest {
    pub source_controller_id: u64,
    pub dest_controller_id: u64,
    pub source_application_id: u64,
    pub dest_application_id: u64,
    /// Exporter-internal entity identifiers (e.g. `HEALTH_RULES`).
    pub config_entities: Vec<String>,
    pub overwrite: bool,
    pub create_tier: bool,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn migration_request_uses_camel_case() {
        let req = MigrationRequest {
            source_controller_id: 1,
            dest_controller_id: 2,
            source_application_id: 101,
            dest_application_id: 202,
            config_entities: vec!["HEALTH_RULES".into(), "SCOPES".into()],
            overwrite: false,
            create_tier: true,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "sourceControllerId": 1,
                "destControllerId": 2,
                "sourceApplicationId": 101,
                "destApplicationId": 202,
                "configEntities": ["HEALTH_RULES", "SCOPES"],
                "overwrite": false,
                "createTier": true
            })
        );
    }

    #[test]
    fn registered_controller_ignores_extra_fields() {
        let c: RegisteredController = serde_json::from_value(json!({
            "id": 3,
            "url": "https://acme.saas.example.com",
            "account": "acme",
            "name": "prod"
        }))
        .unwrap();
        assert_eq!(c.id, 3);
    }
}
