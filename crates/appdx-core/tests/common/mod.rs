// Shared fixtures for the workflow tests.
#![allow(clippy::unwrap_used, dead_code)]

use std::path::Path;
use std::time::Duration;

use regex::Regex;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appdx_core::{ApiSecret, ControllerSettings, Settings};

pub const DEST_URL: &str = "https://dest.example.com";

pub fn controller(url: &str) -> ControllerSettings {
    ControllerSettings {
        url: Url::parse(url).unwrap(),
        account: "customer1".into(),
        api_user: "apiuser".into(),
        secret: ApiSecret::Password(SecretString::from("hunter2".to_string())),
        proxy: None,
    }
}

/// Settings pointing the exporter and the source controller at mock servers.
pub fn settings(exporter: &MockServer, source: &MockServer, output_dir: &Path) -> Settings {
    Settings {
        source: controller(&source.uri()),
        destination: Some(controller(DEST_URL)),
        application_filter: Regex::new("MyApp").unwrap(),
        dashboard_filter: Regex::new("^Ops").unwrap(),
        application_config: vec!["scopes".into()],
        account_config: Vec::new(),
        output_dir: output_dir.to_path_buf(),
        exporter_url: Url::parse(&exporter.uri()).unwrap(),
        create_app: false,
        create_tier: true,
        overwrite: false,
        request_timeout: Duration::from_secs(5),
    }
}

/// Register the source controller as id 1 and the destination as id 2.
pub async fn mount_controllers(exporter: &MockServer, source: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/controllers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "url": format!("{}/", source.uri()) },
            { "id": 2, "url": DEST_URL }
        ])))
        .mount(exporter)
        .await;
}

pub async fn mount_applications(exporter: &MockServer, controller_id: u64, apps: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/controllers/{controller_id}/applications")))
        .respond_with(ResponseTemplate::new(200).set_body_json(apps))
        .mount(exporter)
        .await;
}
