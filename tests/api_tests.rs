use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use medlist::config::Config;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(rxnav: &MockServer) -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.rxnav.base_url = rxnav.uri();
    config.observability.metrics_enabled = false;
    config
}

async fn spawn_app_with(config: Config) -> Router {
    let state = medlist::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    medlist::api::router(state).await
}

async fn spawn_app(rxnav: &MockServer) -> Router {
    spawn_app_with(test_config(rxnav)).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed(method: &str, uri: &str, token: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"));

    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/api/register",
            &json!({ "name": "Test User", "email": email, "password": "secret123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

fn aspirin_search() -> Value {
    json!({
        "drugGroup": {
            "name": null,
            "conceptGroup": [
                { "tty": "BPCK" },
                {
                    "tty": "SBD",
                    "conceptProperties": [
                        { "rxcui": "12345", "name": "Aspirin 325 MG Oral Tablet", "synonym": "", "tty": "SBD" }
                    ]
                }
            ]
        }
    })
}

fn aspirin_related() -> Value {
    json!({
        "relatedGroup": {
            "rxcui": "12345",
            "conceptGroup": [
                { "tty": "IN", "conceptProperties": [{ "rxcui": "1191", "name": "aspirin" }] },
                { "tty": "DF", "conceptProperties": [{ "rxcui": "317541", "name": "Oral Tablet" }] }
            ]
        }
    })
}

async fn mount_aspirin(rxnav: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/drugs.json"))
        .and(query_param("name", "aspirin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(aspirin_search()))
        .mount(rxnav)
        .await;

    Mock::given(method("GET"))
        .and(path("/rxcui/12345/related.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(aspirin_related()))
        .mount(rxnav)
        .await;
}

#[tokio::test]
async fn test_register_and_login() {
    let rxnav = MockServer::start().await;
    let app = spawn_app(&rxnav).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/register",
            &json!({ "name": "Ada", "email": "ada@example.com", "password": "secret123" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["data"]["user"]["email"], "ada@example.com");
    assert_eq!(body["data"]["user"]["name"], "Ada");
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);

    let (status, body) = send(
        &app,
        post_json(
            "/api/register",
            &json!({ "name": "Ada", "email": "ada@example.com", "password": "secret123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], false);
    assert_eq!(body["errors"]["email"][0], "The email has already been taken.");

    let (status, body) = send(
        &app,
        post_json(
            "/api/login",
            &json!({ "email": "ada@example.com", "password": "wrong-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = send(
        &app,
        post_json(
            "/api/login",
            &json!({ "email": "ada@example.com", "password": "secret123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["data"]["token"], token.as_str());
}

#[tokio::test]
async fn test_register_validation_errors() {
    let rxnav = MockServer::start().await;
    let app = spawn_app(&rxnav).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/register",
            &json!({ "email": "not-an-email", "password": "123" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Validation Errors");
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let rxnav = MockServer::start().await;
    let app = spawn_app(&rxnav).await;

    let (status, body) = send(&app, get("/api/user/drugs")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], false);

    let (status, _) = send(&app, authed("GET", "/api/user/drugs", "wrong-token", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = register(&app, "key@example.com").await;
    let request = Request::builder()
        .uri("/api/user/drugs")
        .header("X-Api-Key", &token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["medications"], json!([]));
}

#[tokio::test]
async fn test_search_aspirin() {
    let rxnav = MockServer::start().await;
    mount_aspirin(&rxnav).await;
    let app = spawn_app(&rxnav).await;

    let (status, body) = send(&app, get("/api/search-drug?drug_name=aspirin")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": true,
            "search_term": "aspirin",
            "results": [{
                "rxcui": "12345",
                "name": "Aspirin 325 MG Oral Tablet",
                "ingredient_base_names": ["aspirin"],
                "dosage_forms": ["Oral Tablet"]
            }]
        })
    );
}

#[tokio::test]
async fn test_search_reuses_cached_related_concepts() {
    let rxnav = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drugs.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(aspirin_search()))
        .expect(2)
        .mount(&rxnav)
        .await;

    Mock::given(method("GET"))
        .and(path("/rxcui/12345/related.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(aspirin_related()))
        .expect(1)
        .mount(&rxnav)
        .await;

    let app = spawn_app(&rxnav).await;

    for _ in 0..2 {
        let (status, body) = send(&app, get("/api/search-drug?drug_name=aspirin")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["ingredient_base_names"], json!(["aspirin"]));
    }
}

#[tokio::test]
async fn test_search_caps_results_at_five() {
    let rxnav = MockServer::start().await;

    let concepts = |ids: &[&str]| {
        ids.iter()
            .map(|id| json!({ "rxcui": id, "name": format!("Drug {id}") }))
            .collect::<Vec<_>>()
    };

    Mock::given(method("GET"))
        .and(path("/drugs.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "drugGroup": {
                "conceptGroup": [
                    { "tty": "SBD", "conceptProperties": concepts(&["1", "2", "3"]) },
                    { "tty": "SCD", "conceptProperties": concepts(&["90", "91"]) },
                    { "tty": "SBD", "conceptProperties": concepts(&["4", "5", "6", "7"]) }
                ]
            }
        })))
        .mount(&rxnav)
        .await;

    Mock::given(method("GET"))
        .and(path_regex_related())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "relatedGroup": {} })))
        .expect(5)
        .mount(&rxnav)
        .await;

    let app = spawn_app(&rxnav).await;
    let (status, body) = send(&app, get("/api/search-drug?drug_name=many")).await;

    assert_eq!(status, StatusCode::OK);
    let rxcuis: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["rxcui"].as_str().unwrap())
        .collect();
    assert_eq!(rxcuis, vec!["1", "2", "3", "4", "5"]);
}

fn path_regex_related() -> wiremock::matchers::PathRegexMatcher {
    wiremock::matchers::path_regex(r"^/rxcui/[^/]+/related\.json$")
}

#[tokio::test]
async fn test_related_timeout_keeps_drug_with_empty_lists() {
    let rxnav = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drugs.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(aspirin_search()))
        .mount(&rxnav)
        .await;

    Mock::given(method("GET"))
        .and(path("/rxcui/12345/related.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(aspirin_related())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&rxnav)
        .await;

    let mut config = test_config(&rxnav);
    config.rxnav.request_timeout_seconds = 1;
    let app = spawn_app_with(config).await;

    let (status, body) = send(&app, get("/api/search-drug?drug_name=aspirin")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["results"],
        json!([{
            "rxcui": "12345",
            "name": "Aspirin 325 MG Oral Tablet",
            "ingredient_base_names": [],
            "dosage_forms": []
        }])
    );
}

#[tokio::test]
async fn test_search_upstream_failure() {
    let rxnav = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drugs.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&rxnav)
        .await;

    let app = spawn_app(&rxnav).await;
    let (status, body) = send(&app, get("/api/search-drug?drug_name=aspirin")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Unable to fetch drug data");
}

#[tokio::test]
async fn test_search_malformed_upstream_body() {
    let rxnav = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drugs.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&rxnav)
        .await;

    let app = spawn_app(&rxnav).await;
    let (status, body) = send(&app, get("/api/search-drug?drug_name=aspirin")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Unable to fetch drug data");
}

#[tokio::test]
async fn test_search_requires_drug_name() {
    let rxnav = MockServer::start().await;
    let app = spawn_app(&rxnav).await;

    let (status, body) = send(&app, get("/api/search-drug")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["drug_name"][0], "The drug_name field is required.");

    let (status, _) = send(&app, get("/api/search-drug?drug_name=%20%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_rate_limited_after_ten_requests() {
    let rxnav = MockServer::start().await;
    mount_aspirin(&rxnav).await;
    let app = spawn_app(&rxnav).await;

    for _ in 0..10 {
        let (status, _) = send(&app, get("/api/search-drug?drug_name=aspirin")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, get("/api/search-drug?drug_name=aspirin")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Too many requests. Please try again later.");
    let retry_after = body["retry_after"].as_u64().unwrap();
    assert!(retry_after > 0 && retry_after <= 60);

    // Different drug name, different key
    Mock::given(method("GET"))
        .and(path("/drugs.json"))
        .and(query_param("name", "ibuprofen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "drugGroup": {} })))
        .mount(&rxnav)
        .await;
    let (status, body) = send(&app, get("/api/search-drug?drug_name=ibuprofen")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_non_latin_names_are_rate_limited_separately() {
    let rxnav = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drugs.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "drugGroup": {} })))
        .mount(&rxnav)
        .await;

    let app = spawn_app(&rxnav).await;
    let names = [
        "アスピリン",
        "イブプロフェン",
        "アセトアミノフェン",
        "ロキソプロフェン",
        "セレコキシブ",
        "ナプロキセン",
        "ジクロフェナク",
        "メトホルミン",
        "アムロジピン",
        "ロサルタン",
        "アモキシシリン",
    ];

    for name in names {
        let uri = format!("/api/search-drug?drug_name={}", urlencoding::encode(name));
        let (status, body) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::OK, "{name} was rejected: {body}");
        assert_eq!(body["search_term"], name);
    }
}

#[tokio::test]
async fn test_user_drug_lifecycle() {
    let rxnav = MockServer::start().await;
    mount_aspirin(&rxnav).await;

    Mock::given(method("GET"))
        .and(path("/rxcui/12345/properties.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": { "rxcui": "12345", "name": "Aspirin 325 MG Oral Tablet", "tty": "SBD" }
        })))
        .mount(&rxnav)
        .await;

    Mock::given(method("GET"))
        .and(path("/rxcui/00000/properties.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&rxnav)
        .await;

    let app = spawn_app(&rxnav).await;
    let token = register(&app, "list@example.com").await;
    let add = json!({ "rxcui": "12345" });

    let (status, body) = send(&app, authed("POST", "/api/user/drugs", &token, Some(&add))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": true, "message": "Drug added successfully" }));

    let (status, body) = send(&app, authed("POST", "/api/user/drugs", &token, Some(&add))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Drug already exists in your list");

    let invalid = json!({ "rxcui": "00000" });
    let (status, body) =
        send(&app, authed("POST", "/api/user/drugs", &token, Some(&invalid))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid RXCUI provided");

    let (status, body) = send(
        &app,
        authed("POST", "/api/user/drugs", &token, Some(&json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["rxcui"].is_array());

    let (status, body) = send(&app, authed("GET", "/api/user/drugs", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": true,
            "medications": [{
                "rxcui": "12345",
                "drug_name": "Aspirin 325 MG Oral Tablet",
                "ingredient_base_names": ["aspirin"],
                "dosage_forms": ["Oral Tablet"]
            }]
        })
    );

    // Lists are per user
    let other = register(&app, "other@example.com").await;
    let (_, body) = send(&app, authed("GET", "/api/user/drugs", &other, None)).await;
    assert_eq!(body["medications"], json!([]));

    let (status, body) =
        send(&app, authed("DELETE", "/api/user/drugs/12345", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Drug deleted successfully");

    let (status, body) =
        send(&app, authed("DELETE", "/api/user/drugs/12345", &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Drug not found in your list");
}

#[tokio::test]
async fn test_health() {
    let rxnav = MockServer::start().await;
    let app = spawn_app(&rxnav).await;

    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);
    assert_eq!(body["database"], "ok");
}
