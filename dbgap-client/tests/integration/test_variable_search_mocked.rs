//! Integration tests for dbGaP variable search using mocked HTTP responses
//!
//! A wiremock server stands in for the NCBI ESearch and ESummary endpoints so
//! the paging, validation and filtering pipeline runs without network access.

use dbgap_client::{
    ClientConfig, GapClient, GapError, KeywordFilter, RecordError, ValidationPolicy,
};
use serde_json::{Value, json};
use tracing_test::traced_test;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEBENV: &str = "MCID_6523a5f1b2c3d4e5f6a7b8c9";

fn esearch_body(count: usize) -> Value {
    json!({
        "header": {"type": "esearch", "version": "0.3"},
        "esearchresult": {
            "count": count.to_string(),
            "retmax": "0",
            "retstart": "0",
            "querykey": "1",
            "webenv": WEBENV,
            "idlist": [],
            "querytranslation": "2[s_discriminator] AND phs000280[All Fields]"
        }
    })
}

/// Build an ESummary page from `(uid, variable_id, name, description)` tuples
fn esummary_body(records: &[(&str, &str, &str, &str)]) -> Value {
    let mut result = serde_json::Map::new();
    let uids: Vec<&str> = records.iter().map(|(uid, ..)| *uid).collect();
    result.insert("uids".to_string(), json!(uids));

    for (uid, variable_id, name, description) in records {
        result.insert(
            uid.to_string(),
            json!({
                "uid": uid,
                "d_object_type": "variable",
                "d_variable_results": {
                    "d_variable_id": variable_id,
                    "d_variable_name": name,
                    "d_variable_description": description
                }
            }),
        );
    }

    json!({
        "header": {"type": "esummary", "version": "0.3"},
        "result": result
    })
}

async fn mount_esearch(server: &MockServer, count: usize) {
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("db", "gap"))
        .and(query_param("usehistory", "y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(count)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_esummary_page(server: &MockServer, retstart: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .and(query_param("db", "gap"))
        .and(query_param("WebEnv", WEBENV))
        .and(query_param("query_key", "1"))
        .and(query_param("retstart", retstart))
        .and(query_param("retmax", "500"))
        .and(query_param("retmode", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

fn create_mock_client(server: &MockServer) -> GapClient {
    let config = ClientConfig::new()
        .with_base_url(server.uri())
        .with_email("researcher@example.org")
        .with_rate_limit(100.0); // High rate limit for tests

    GapClient::with_config(config).expect("client should build")
}

#[tokio::test]
#[traced_test]
async fn test_two_pages_are_fetched_and_filtered() {
    let server = MockServer::start().await;
    mount_esearch(&server, 600).await;
    mount_esummary_page(
        &server,
        "0",
        esummary_body(&[
            ("12345", "2|phv00012345", "SMK_STATUS", "Current cigarette smoking status"),
            ("12346", "2|phv00012346", "BMI", "Body mass index"),
            ("12399", "2|phv00012399", "PACKYRS", "Pack-years of CIGARETTES"),
        ]),
    )
    .await;
    mount_esummary_page(
        &server,
        "500",
        esummary_body(&[
            ("10001", "2|phv00010001", "NIC_DEP", "Nicotine dependence"),
            ("10002", "2|phv00010002", "AGE", "Age at exam"),
        ]),
    )
    .await;

    let client = create_mock_client(&server);
    let (table, summary) = client
        .collect_phenotypes("phs000280", &KeywordFilter::default(), ValidationPolicy::FailFast)
        .await
        .expect("collection should succeed");

    assert_eq!(summary.total_count, 600);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.records, 5);
    assert_eq!(summary.matched, 3);
    assert_eq!(summary.skipped, 0);

    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(
        lines,
        vec![
            "NIC_DEP\tphv00010001\tNicotine dependence",
            "SMK_STATUS\tphv00012345\tCurrent cigarette smoking status",
            "PACKYRS\tphv00012399\tPack-years of CIGARETTES",
        ]
    );
    assert!(logs_contain("Search with history completed"));
}

#[tokio::test]
async fn test_search_sends_term_and_identification() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("term", "2[s_discriminator] AND phs000280.v8.p1"))
        .and(query_param("email", "researcher@example.org"))
        .and(query_param("tool", "dbgap-client"))
        .and(query_param("retmode", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(42)))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let result = client
        .search_variables(" phs000280.v8.p1 ")
        .await
        .expect("search should succeed");

    assert_eq!(result.total_count, 42);
    assert!(result.has_history());
    let session = result.history_session().unwrap();
    assert_eq!(session.webenv, WEBENV);
    assert_eq!(session.query_key, "1");
    assert_eq!(
        result.query_translation.as_deref(),
        Some("2[s_discriminator] AND phs000280[All Fields]")
    );
}

#[tokio::test]
async fn test_zero_results_skip_summary_requests() {
    let server = MockServer::start().await;
    mount_esearch(&server, 0).await;

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let (table, summary) = client
        .collect_phenotypes("phs999999", &KeywordFilter::default(), ValidationPolicy::FailFast)
        .await
        .expect("empty search should succeed");

    assert!(table.is_empty());
    assert_eq!(summary.pages, 0);
}

#[tokio::test]
async fn test_invalid_record_fails_fast() {
    let server = MockServer::start().await;
    mount_esearch(&server, 2).await;
    mount_esummary_page(
        &server,
        "0",
        esummary_body(&[
            ("1", "2|phv00000001", "SMK", "Smoking"),
            ("2", "2|pht00000002", "TBL", "Tobacco table"),
        ]),
    )
    .await;

    let client = create_mock_client(&server);
    let err = client
        .collect_phenotypes("phs000280", &KeywordFilter::default(), ValidationPolicy::FailFast)
        .await
        .unwrap_err();

    match err {
        GapError::InvalidRecord(RecordError::InvalidAccession { uid, value }) => {
            assert_eq!(uid, "2");
            assert_eq!(value, "pht00000002");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
#[traced_test]
async fn test_invalid_record_skipped_when_requested() {
    let server = MockServer::start().await;
    mount_esearch(&server, 2).await;
    mount_esummary_page(
        &server,
        "0",
        esummary_body(&[
            ("1", "2|phv00000001", "SMK", "Smoking"),
            ("2", "phv00000002", "TBL", "Tobacco table"),
        ]),
    )
    .await;

    let client = create_mock_client(&server);
    let (table, summary) = client
        .collect_phenotypes("phs000280", &KeywordFilter::default(), ValidationPolicy::SkipAndLog)
        .await
        .expect("skip policy should not fail");

    assert_eq!(table.len(), 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(table.get("phv00000001"), Some("SMK\tphv00000001\tSmoking"));
    assert!(logs_contain("Skipping invalid variable record"));
}

#[tokio::test]
async fn test_duplicate_accessions_across_pages_keep_last() {
    let server = MockServer::start().await;
    mount_esearch(&server, 501).await;
    mount_esummary_page(
        &server,
        "0",
        esummary_body(&[("1", "2|phv00000001", "OLD", "Smoking (old)")]),
    )
    .await;
    mount_esummary_page(
        &server,
        "500",
        esummary_body(&[("2", "3|phv00000001", "NEW", "Smoking (new)")]),
    )
    .await;

    let client = create_mock_client(&server);
    let (table, summary) = client
        .collect_phenotypes("phs000280", &KeywordFilter::default(), ValidationPolicy::FailFast)
        .await
        .unwrap();

    assert_eq!(summary.matched, 2);
    assert_eq!(table.len(), 1);
    assert_eq!(table.replaced(), 1);
    assert_eq!(table.get("phv00000001"), Some("NEW\tphv00000001\tSmoking (new)"));
}

#[tokio::test]
async fn test_esearch_error_field() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": {"ERROR": "Invalid query"}
        })))
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let err = client.search_variables("phs000280").await.unwrap_err();

    match err {
        GapError::ApiError { status, message } => {
            assert_eq!(status, 200);
            assert!(message.contains("Invalid query"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_webenv_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": {"count": "3", "idlist": []}
        })))
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let err = client
        .search_and_fetch_variables("phs000280", ValidationPolicy::FailFast)
        .await
        .unwrap_err();

    assert!(matches!(err, GapError::WebEnvNotAvailable));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    mount_esearch(&server, 10).await;

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let err = client
        .search_and_fetch_variables("phs000280", ValidationPolicy::FailFast)
        .await
        .unwrap_err();

    assert!(matches!(err, GapError::ApiError { status: 503, .. }));
}

#[tokio::test]
async fn test_too_many_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let err = client.search_variables("phs000280").await.unwrap_err();

    assert!(matches!(err, GapError::RateLimitExceeded));
}

#[tokio::test]
async fn test_expired_history_session() {
    let server = MockServer::start().await;
    mount_esearch(&server, 10).await;

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"type": "esummary", "version": "0.3"},
            "error": "Invalid query_key"
        })))
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let err = client
        .search_and_fetch_variables("phs000280", ValidationPolicy::SkipAndLog)
        .await
        .unwrap_err();

    match err {
        GapError::HistorySessionError(message) => assert_eq!(message, "Invalid query_key"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_custom_page_size() {
    let server = MockServer::start().await;
    mount_esearch(&server, 5).await;

    for retstart in ["0", "2", "4"] {
        let variable_id = format!("2|phv0000000{retstart}");
        Mock::given(method("GET"))
            .and(path("/esummary.fcgi"))
            .and(query_param("retstart", retstart))
            .and(query_param("retmax", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(esummary_body(&[(
                    retstart,
                    variable_id.as_str(),
                    "SMK",
                    "Smoking",
                )])),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = ClientConfig::new()
        .with_base_url(server.uri())
        .with_rate_limit(100.0)
        .with_page_size(2);
    let client = GapClient::with_config(config).unwrap();

    let records = client
        .search_and_fetch_variables("phs000280", ValidationPolicy::FailFast)
        .await
        .unwrap();

    let accessions: Vec<&str> = records.iter().map(|r| r.accession.as_str()).collect();
    assert_eq!(accessions, vec!["phv00000000", "phv00000002", "phv00000004"]);
}

async fn mount_esearch_result(server: &MockServer, esearchresult: Value) {
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "esearchresult": esearchresult })),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_no_esummary(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_missing_count_fails() {
    let server = MockServer::start().await;
    mount_esearch_result(
        &server,
        json!({"querykey": "1", "webenv": WEBENV, "idlist": []}),
    )
    .await;
    mount_no_esummary(&server).await;

    let client = create_mock_client(&server);
    let err = client
        .collect_phenotypes("phs000280", &KeywordFilter::default(), ValidationPolicy::FailFast)
        .await
        .unwrap_err();

    assert!(matches!(err, GapError::InvalidResponse(_)), "{err:?}");
}

#[tokio::test]
async fn test_non_numeric_count_fails() {
    let server = MockServer::start().await;
    mount_esearch_result(
        &server,
        json!({"count": "many", "querykey": "1", "webenv": WEBENV, "idlist": []}),
    )
    .await;
    mount_no_esummary(&server).await;

    let client = create_mock_client(&server);
    let err = client.search_variables("phs000280").await.unwrap_err();

    match err {
        GapError::InvalidResponse(message) => assert!(message.contains("many")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_summary_without_uid_list_fails() {
    let server = MockServer::start().await;
    mount_esearch(&server, 1).await;

    let mut body = esummary_body(&[("1", "2|phv00000001", "SMK", "Ever smoked")]);
    body["result"]
        .as_object_mut()
        .expect("result is an object")
        .remove("uids");
    mount_esummary_page(&server, "0", body).await;

    let client = create_mock_client(&server);
    let err = client
        .collect_phenotypes("phs000280", &KeywordFilter::default(), ValidationPolicy::SkipAndLog)
        .await
        .unwrap_err();

    assert!(matches!(err, GapError::InvalidResponse(_)), "{err:?}");
}

#[tokio::test]
async fn test_huge_count_does_not_preallocate() {
    let server = MockServer::start().await;
    mount_esearch_result(
        &server,
        json!({"count": "100000000000000000", "querykey": "1", "webenv": WEBENV, "idlist": []}),
    )
    .await;

    // First page fails, so the walk stops after one request
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .and(query_param("retstart", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Unable to obtain query #1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_mock_client(&server);
    let err = client
        .search_and_fetch_variables("phs000280", ValidationPolicy::FailFast)
        .await
        .unwrap_err();

    assert!(matches!(err, GapError::HistorySessionError(_)), "{err:?}");
}
