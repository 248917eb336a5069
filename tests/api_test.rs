//! End-to-end behavior of the composed application.

mod common;

use std::collections::BTreeMap;
use std::fs;

use axum::http::{header, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use common::*;
use fake_api::config::{EndpointDefinition, StaticConfig};
use fake_api::http::X_REQUEST_ID;
use fake_api::lifecycle::StartupError;
use fake_api::FakeApiServer;

#[tokio::test]
async fn test_defaults_serve_empty_json() {
    let root = resource_root(&[]);
    let definition = EndpointDefinition {
        path: "status".into(),
        method: String::new(),
        file: String::new(),
        status: 0,
        ..Default::default()
    };
    let server = FakeApiServer::new(config(vec![definition], vec![]), root.path()).unwrap();

    assert_eq!(server.routes().len(), 1);
    assert_eq!(server.routes()[0].method, "GET");
    assert_eq!(server.routes()[0].path, "/status");

    let response = server.app().oneshot(request("GET", "/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_file_body_ignores_content_type_header() {
    let root = resource_root(&[("report.json", r#"{"ok":true}"#)]);
    let definition = EndpointDefinition {
        path: "/report.json".into(),
        file: "report.json".into(),
        headers: BTreeMap::from([
            ("Content-type".to_string(), "text/plain".to_string()),
            ("X-Fake".to_string(), "yes".to_string()),
        ]),
        ..Default::default()
    };
    let server = FakeApiServer::new(config(vec![definition], vec![]), root.path()).unwrap();

    let response = server
        .app()
        .oneshot(request("GET", "/report.json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    assert_eq!(response.headers()["x-fake"], "yes");
    assert_eq!(body_bytes(response).await, br#"{"ok":true}"#);
}

#[tokio::test]
async fn test_missing_file_is_skipped() {
    let root = resource_root(&[]);
    let server = FakeApiServer::new(
        config(
            vec![
                endpoint("/alive"),
                EndpointDefinition {
                    path: "/gone".into(),
                    file: "missing.json".into(),
                    ..Default::default()
                },
            ],
            vec![],
        ),
        root.path(),
    )
    .unwrap();

    assert_eq!(server.routes().len(), 1);

    let app = server.app();
    let response = app.clone().oneshot(request("GET", "/gone")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "no endpoint for GET /gone");

    let response = app.oneshot(request("GET", "/alive")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_file_deleted_after_startup() {
    let root = resource_root(&[("data.json", "[1,2,3]")]);
    let server = FakeApiServer::new(
        config(
            vec![
                EndpointDefinition {
                    path: "/data".into(),
                    file: "data.json".into(),
                    ..Default::default()
                },
                endpoint("/other"),
            ],
            vec![],
        ),
        root.path(),
    )
    .unwrap();
    let app = server.app();

    fs::remove_file(root.path().join("data.json")).unwrap();

    let response = app.clone().oneshot(request("GET", "/data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(request("GET", "/other")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_no_definitions_refused() {
    let root = resource_root(&[]);
    let result = FakeApiServer::new(config(vec![], vec![]), root.path());
    assert!(matches!(result, Err(StartupError::NoDefinitions)));
}

#[tokio::test]
async fn test_duplicate_keeps_first_definition() {
    let root = resource_root(&[("first.json", "\"first\""), ("second.json", "\"second\"")]);
    let server = FakeApiServer::new(
        config(
            vec![
                EndpointDefinition {
                    path: "/dup".into(),
                    file: "first.json".into(),
                    ..Default::default()
                },
                EndpointDefinition {
                    path: "dup".into(),
                    method: "get".into(),
                    file: "second.json".into(),
                    ..Default::default()
                },
            ],
            vec![],
        ),
        root.path(),
    )
    .unwrap();

    assert_eq!(server.routes().len(), 1);
    let response = server.app().oneshot(request("GET", "/dup")).await.unwrap();
    assert_eq!(body_bytes(response).await, b"\"first\"");
}

#[tokio::test]
async fn test_methods_on_same_path() {
    let root = resource_root(&[]);
    let server = FakeApiServer::new(
        config(
            vec![
                endpoint("/thing"),
                EndpointDefinition {
                    path: "/thing".into(),
                    method: "POST".into(),
                    status: 201,
                    ..Default::default()
                },
            ],
            vec![],
        ),
        root.path(),
    )
    .unwrap();
    let app = server.app();

    let response = app.clone().oneshot(request("GET", "/thing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(request("POST", "/thing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(request("DELETE", "/thing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_prefix_mounts_everything() {
    let root = resource_root(&[]);
    let mut config = config(vec![endpoint("/ping")], vec![]);
    config.api.prefix = "/api/v1".into();
    let server = FakeApiServer::new(config, root.path()).unwrap();

    assert_eq!(server.routes()[0].path, "/api/v1/ping");

    let app = server.app();
    let response = app.clone().oneshot(request("GET", "/api/v1/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(request("GET", "/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resource_crud() {
    let root = resource_root(&[(
        "users.json",
        r#"[{"id": 1, "name": "ada"}, {"id": 2, "name": "bob"}]"#,
    )]);
    let server = FakeApiServer::new(config(vec![], vec![resource("users")]), root.path()).unwrap();
    assert_eq!(server.routes().len(), 7);
    let app = server.app();

    let response = app.clone().oneshot(request("GET", "/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = app.clone().oneshot(request("GET", "/users/2")).await.unwrap();
    assert_eq!(body_json(response).await, json!({"id": 2, "name": "bob"}));

    let response = app
        .clone()
        .oneshot(json_request("POST", "/users", r#"{"name": "cy"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({"name": "cy"}));

    let response = app
        .clone()
        .oneshot(json_request("PATCH", "/users/1", r#"{"name": "ada l."}"#))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({"id": 1, "name": "ada l."}));

    let response = app.clone().oneshot(request("DELETE", "/users/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(request("GET", "/users/9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // nothing is written back
    let on_disk: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.path().join("users.json")).unwrap())
            .unwrap();
    assert_eq!(on_disk[0]["name"], "ada");
}

#[tokio::test]
async fn test_request_id_echoed() {
    let root = resource_root(&[]);
    let server = FakeApiServer::new(config(vec![endpoint("/id")], vec![]), root.path()).unwrap();
    let app = server.app();

    let response = app.clone().oneshot(request("GET", "/id")).await.unwrap();
    assert!(response.headers().contains_key(X_REQUEST_ID));

    let mut req = request("GET", "/id");
    req.headers_mut()
        .insert(X_REQUEST_ID, "given-id".parse().unwrap());
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], "given-id");
}

#[tokio::test]
async fn test_static_dir() {
    let root = resource_root(&[("public/hello.txt", "hello")]);
    let mut config = config(vec![endpoint("/api")], vec![]);
    config.api.static_dir = Some(StaticConfig {
        url: "/assets".into(),
        path: root.path().join("public"),
    });
    let server = FakeApiServer::new(config, root.path()).unwrap();
    let app = server.app();

    let response = app
        .clone()
        .oneshot(request("GET", "/assets/hello.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"hello");

    let response = app.oneshot(request("GET", "/api")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reload_swaps_routes() {
    let root = resource_root(&[]);
    let server = FakeApiServer::new(config(vec![endpoint("/old")], vec![]), root.path()).unwrap();
    let app = server.app();

    let routes = server
        .live_router()
        .reload(&config(vec![endpoint("/new")], vec![]).api)
        .unwrap();
    assert_eq!(routes.len(), 1);

    let response = app.clone().oneshot(request("GET", "/new")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.clone().oneshot(request("GET", "/old")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // a rejected reload leaves the current routes in place
    assert!(server.live_router().reload(&config(vec![], vec![]).api).is_err());
    let response = app.oneshot(request("GET", "/new")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_legacy_param_route_and_resource_do_not_collide() {
    let root = resource_root(&[("users.json", r#"[{"id": 1, "name": "ada"}]"#)]);
    let server = FakeApiServer::new(
        config(vec![endpoint("/users/:id")], vec![resource("users")]),
        root.path(),
    )
    .unwrap();

    // the url sorts first and keeps GET; the resource's GET item route is refused
    assert_eq!(server.routes().len(), 7);
    let app = server.app();

    let response = app.clone().oneshot(request("GET", "/users/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());

    let response = app.oneshot(request("DELETE", "/users/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_conflicting_templates_are_skipped() {
    let root = resource_root(&[]);
    let server = FakeApiServer::new(
        config(vec![endpoint("/f/{id}"), endpoint("/f/*rest"), endpoint("/ok")], vec![]),
        root.path(),
    )
    .unwrap();

    assert_eq!(server.routes().len(), 2);
    let response = server.app().oneshot(request("GET", "/ok")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut strict = config(vec![endpoint("/a/:id"), endpoint("/a/{id}")], vec![]);
    strict.api.strict = true;
    assert!(matches!(
        FakeApiServer::new(strict, root.path()),
        Err(StartupError::Strict(1))
    ));
}
