use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalogos_capes::catalog::{CatalogClient, CatalogHttpClient, CatalogSettings};
use catalogos_capes::error::CatalogError;

const SEARCH_PATH: &str = "/api/3/action/package_search";

fn settings_for(server: &MockServer) -> CatalogSettings {
    CatalogSettings {
        api_base: format!("{}/api/3/action", server.uri()),
        ..CatalogSettings::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_table_flattens_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("q", "catalogo-de-teses-e-dissertacoes"))
        .and(query_param("rows", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": {"count": 1, "results": [{
                "name": "ctd-2020-2023",
                "title": "Catálogo de Teses e Dissertações 2020-2023",
                "resources": [
                    {"url": "http://x/a.csv", "format": "CSV"},
                    {"url": "http://x/b.xlsx", "format": "XLSX"}
                ]
            }]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let table = tokio::task::spawn_blocking(move || {
        CatalogHttpClient::with_settings(settings)?.fetch_table()
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(
        table.rows()[0].dataset_name,
        "Catálogo de Teses e Dissertações 2020-2023"
    );
    assert_eq!(table.rows()[1].resource_url, "http://x/b.xlsx");
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let result = tokio::task::spawn_blocking(move || {
        CatalogHttpClient::with_settings(settings)?.fetch_all()
    })
    .await
    .unwrap();

    assert_matches!(
        result,
        Err(CatalogError::CatalogStatus { status: 500, .. })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let result = tokio::task::spawn_blocking(move || {
        CatalogHttpClient::with_settings(settings)?.fetch_all()
    })
    .await
    .unwrap();

    assert_matches!(result, Err(CatalogError::CatalogParse(_)));
}

#[test]
fn unreachable_portal_is_network_error() {
    let client = CatalogHttpClient::with_settings(CatalogSettings {
        api_base: "http://127.0.0.1:9/api/3/action".to_string(),
        ..CatalogSettings::default()
    })
    .unwrap();
    let err = client.fetch_all().unwrap_err();
    assert_matches!(err, CatalogError::CatalogHttp(_));
    assert!(err.is_catalog_error());
}
