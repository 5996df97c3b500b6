#![allow(clippy::unwrap_used)]
// Migrate workflow against a mocked exporter.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appdx_core::{ConfigEntity, Context, CoreError, MigrationReport, MigrationTemplate, run_migrate};

async fn servers() -> (MockServer, MockServer, tempfile::TempDir) {
    let exporter = MockServer::start().await;
    let controller = MockServer::start().await;
    common::mount_controllers(&exporter, &controller).await;
    (exporter, controller, tempfile::tempdir().unwrap())
}

#[tokio::test]
async fn test_missing_destination_application_is_skipped() {
    let (exporter, controller, out) = servers().await;
    common::mount_applications(&exporter, 1, json!([{ "name": "MyApp", "id": 101 }])).await;
    common::mount_applications(&exporter, 2, json!([{ "name": "SomethingElse", "id": 300 }])).await;
    Mock::given(method("POST"))
        .and(path("/api/rest/app-config"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&exporter)
        .await;

    let settings = common::settings(&exporter, &controller, out.path());
    let ctx = Context::new(&settings).unwrap();
    let report = run_migrate(&ctx).await.unwrap();

    assert_eq!(
        report,
        MigrationReport {
            migrated: vec![],
            skipped: vec!["MyApp".into()],
            failed: vec![],
        }
    );
}

#[tokio::test]
async fn test_matched_application_is_posted_with_destination_id() {
    let (exporter, controller, out) = servers().await;
    common::mount_applications(
        &exporter,
        1,
        json!([
            { "name": "MyApp", "id": 101 },
            { "name": "MyApp Legacy", "id": 102 }
        ]),
    )
    .await;
    common::mount_applications(&exporter, 2, json!([{ "name": "MyApp", "id": 201 }])).await;
    Mock::given(method("POST"))
        .and(path("/api/rest/app-config"))
        .and(body_json(json!({
            "sourceControllerId": 1,
            "destControllerId": 2,
            "sourceApplicationId": 101,
            "destApplicationId": 201,
            "configEntities": ["SCOPES", "HEALTH_RULES"],
            "overwrite": false,
            "createTier": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("done"))
        .expect(1)
        .mount(&exporter)
        .await;

    let mut settings = common::settings(&exporter, &controller, out.path());
    settings.application_config = vec!["scopes".into(), "health-rules".into()];
    let ctx = Context::new(&settings).unwrap();
    let report = run_migrate(&ctx).await.unwrap();

    assert_eq!(report.migrated, vec!["MyApp".to_owned()]);
    assert_eq!(report.skipped, vec!["MyApp Legacy".to_owned()]);
}

#[tokio::test]
async fn test_numeric_word_names_pair_exactly() {
    let (exporter, controller, out) = servers().await;
    common::mount_applications(
        &exporter,
        1,
        json!([
            { "name": "MyApp", "id": 101 },
            { "name": "MyApp 2", "id": 102 }
        ]),
    )
    .await;
    common::mount_applications(
        &exporter,
        2,
        json!([
            { "name": "MyApp 2", "id": 202 },
            { "name": "MyApp", "id": 201 }
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/rest/app-config"))
        .and(body_partial_json(json!({ "sourceApplicationId": 102, "destApplicationId": 202 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&exporter)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/rest/app-config"))
        .and(body_partial_json(json!({ "sourceApplicationId": 101, "destApplicationId": 201 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&exporter)
        .await;

    let settings = common::settings(&exporter, &controller, out.path());
    let ctx = Context::new(&settings).unwrap();
    let report = run_migrate(&ctx).await.unwrap();

    assert_eq!(report.migrated, vec!["MyApp".to_owned(), "MyApp 2".to_owned()]);
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn test_rejected_request_is_recorded_as_failed() {
    let (exporter, controller, out) = servers().await;
    common::mount_applications(&exporter, 1, json!([{ "name": "MyApp", "id": 101 }])).await;
    common::mount_applications(&exporter, 2, json!([{ "name": "MyApp", "id": 201 }])).await;
    Mock::given(method("POST"))
        .and(path("/api/rest/app-config"))
        .respond_with(ResponseTemplate::new(500).set_body_string("exporter exploded"))
        .mount(&exporter)
        .await;

    let settings = common::settings(&exporter, &controller, out.path());
    let ctx = Context::new(&settings).unwrap();
    let report = run_migrate(&ctx).await.unwrap();

    assert_eq!(report.failed, vec!["MyApp".to_owned()]);
}

#[tokio::test]
async fn test_unknown_entity_fails_before_network() {
    let exporter = MockServer::start().await;
    let controller = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();

    let mut settings = common::settings(&exporter, &controller, out.path());
    settings.application_config = vec!["scopes".into(), "widgets".into()];
    let ctx = Context::new(&settings).unwrap();
    let result = run_migrate(&ctx).await;

    assert!(
        matches!(result, Err(CoreError::UnknownEntity { ref name }) if name == "widgets"),
        "expected UnknownEntity, got: {result:?}"
    );
    assert!(exporter.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_account_migration_not_implemented() {
    let exporter = MockServer::start().await;
    let controller = MockServer::start().await;
    let out = tempfile::tempdir().unwrap();

    let mut settings = common::settings(&exporter, &controller, out.path());
    settings.account_config = vec!["email-templates".into()];
    let ctx = Context::new(&settings).unwrap();
    let result = run_migrate(&ctx).await;

    assert!(
        matches!(result, Err(CoreError::NotImplemented { .. })),
        "expected NotImplemented, got: {result:?}"
    );
    assert!(exporter.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unregistered_destination_is_fatal() {
    let exporter = MockServer::start().await;
    let controller = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/controllers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "url": controller.uri() }
        ])))
        .mount(&exporter)
        .await;
    let out = tempfile::tempdir().unwrap();

    let settings = common::settings(&exporter, &controller, out.path());
    let ctx = Context::new(&settings).unwrap();
    let result = run_migrate(&ctx).await;

    match result {
        Err(CoreError::ControllerNotRegistered { url }) => assert!(url.starts_with(common::DEST_URL)),
        other => panic!("expected ControllerNotRegistered, got: {other:?}"),
    }
}

#[test]
fn template_maps_entities_in_order() {
    let exporter_uri = "http://localhost:1";
    let settings = appdx_core::Settings {
        overwrite: true,
        ..common_settings(exporter_uri)
    };
    let template = MigrationTemplate::new(
        1,
        2,
        &[ConfigEntity::Policies, ConfigEntity::Actions],
        &settings,
    );
    let request = template.instantiate(11, 22);

    assert_eq!(request.config_entities, vec!["POLICIES", "ACTIONS"]);
    assert_eq!((request.source_application_id, request.dest_application_id), (11, 22));
    assert!(request.overwrite);
    assert!(request.create_tier);
}

fn common_settings(uri: &str) -> appdx_core::Settings {
    appdx_core::Settings {
        source: common::controller(uri),
        destination: None,
        application_filter: regex::Regex::new(".*").unwrap(),
        dashboard_filter: regex::Regex::new(".*").unwrap(),
        application_config: vec![],
        account_config: vec![],
        output_dir: std::env::temp_dir(),
        exporter_url: url::Url::parse(uri).unwrap(),
        create_app: false,
        create_tier: true,
        overwrite: false,
        request_timeout: std::time::Duration::from_secs(1),
    }
}
