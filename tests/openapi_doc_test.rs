#![cfg(feature = "openapi")]

use utoipa::OpenApi as _;

#[test]
fn api_doc_lists_dashboard_routes() {
    let doc = chargedeck::web::ApiDoc::openapi();
    let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
    for expected in [
        "/api/onboarding",
        "/api/onboarding/route/{index}",
        "/api/session/resume",
        "/api/tariffs/{name}/rate",
        "/api/history/export",
        "/api/logs/tail",
    ] {
        assert!(paths.contains(&expected), "missing path {}", expected);
    }
}

#[test]
fn config_schema_covers_sections() {
    let schema = serde_json::to_value(schemars::schema_for!(chargedeck::Config)).unwrap();
    let props = schema["properties"].as_object().unwrap();
    for section in ["web", "logging", "storage", "session", "locale", "chargers"] {
        assert!(props.contains_key(section), "missing section {}", section);
    }
}
