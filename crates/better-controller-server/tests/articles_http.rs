// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP tests of the demo articles controller through the axum adapter.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use better_controller_server::demo::{self, ArticleStore};
use serde_json::{json, Value as JsonValue};

fn server() -> TestServer {
    TestServer::new(demo::article_routes(&ArticleStore::seeded()).into_router()).unwrap()
}

fn accept(value: &'static str) -> (HeaderName, HeaderValue) {
    (HeaderName::from_static("accept"), HeaderValue::from_static(value))
}

fn signed_in() -> (HeaderName, HeaderValue) {
    (HeaderName::from_static("x-user-id"), HeaderValue::from_static("1"))
}

#[tokio::test]
async fn test_index_renders_page_component_in_layout() {
    let response = server().get("/articles").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "text/html; charset=utf-8");
    let body = response.text();
    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(body.contains("<h1>Articles</h1>"));
    assert!(body.contains("<a href=\"/articles/1\">Hello, world</a>"));
}

#[tokio::test]
async fn test_index_json_envelope_with_pagination() {
    let response = server().get("/articles").add_query_param("format", "json").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<JsonValue>();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["version"], "v1");
    assert_eq!(body["meta"]["pagination"]["total_count"], 2);
    assert_eq!(body["meta"]["pagination"]["current_page"], 1);
}

#[tokio::test]
async fn test_index_csv_download() {
    let response = server().get("/articles?format=csv").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "text/csv");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"articles.csv\""
    );
    let body = response.text();
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("ID,Title,Created"));
    assert!(lines.next().unwrap().starts_with("1,\"Hello, world\","));
}

#[tokio::test]
async fn test_show_by_extension_and_missing_record() {
    let server = server();

    let found = server.get("/articles/2.json").await;
    assert_eq!(found.status_code(), StatusCode::OK);
    assert_eq!(found.json::<JsonValue>()["data"]["resource"]["title"], "Streams");

    let (name, value) = accept("application/json");
    let missing = server.get("/articles/99").add_header(name, value).await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        missing.json::<JsonValue>(),
        json!({
            "data": { "success": false, "error": "Couldn't find Article with 'id'=99" },
            "meta": { "version": "v1" }
        })
    );

    let redirected = server.get("/articles/99").await;
    assert_eq!(redirected.status_code(), StatusCode::FOUND);
    assert_eq!(redirected.header("location"), "/articles");
    assert_eq!(redirected.header("x-flash-alert"), "Article not found");
}

#[tokio::test]
async fn test_show_renders_component() {
    let response = server().get("/articles/1").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("<article id=\"article_1\"><h1>Hello, world</h1>"));
}

#[tokio::test]
async fn test_create_redirects_with_notice() {
    let server = server();
    let response = server
        .post("/articles")
        .form(&[("article[title]", "Third"), ("article[body]", "More"), ("commit", "Save")])
        .await;

    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(response.header("location"), "/articles/3");
    assert_eq!(response.header("x-flash-notice"), "Article created");

    let (name, value) = accept("application/json");
    let listed = server.get("/articles").add_header(name, value).await;
    assert_eq!(listed.json::<JsonValue>()["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_validation_renders_form_422() {
    let response = server()
        .post("/articles")
        .form(&[("article[title]", " "), ("article[body]", "kept")])
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text();
    assert!(body.contains("<li>Title can&#39;t be blank</li>"));
    assert!(body.contains("<textarea name=\"article[body]\">kept</textarea>"));
}

#[tokio::test]
async fn test_create_turbo_stream() {
    let (name, value) = accept("text/vnd.turbo-stream.html, text/html");
    let response = server()
        .post("/articles")
        .add_header(name, value)
        .json(&json!({ "article": { "title": "Live", "admin": true } }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "text/vnd.turbo-stream.html; charset=utf-8");
    let body = response.text();
    assert!(body.starts_with(
        "<turbo-stream action=\"prepend\" target=\"articles\"><template><li id=\"article_3\">"
    ));
    assert!(body.contains("<turbo-stream action=\"update\" target=\"flash\">"));
}

#[tokio::test]
async fn test_create_turbo_stream_validation_failure() {
    let (name, value) = accept("text/vnd.turbo-stream.html");
    let response = server()
        .post("/articles")
        .add_header(name, value)
        .json(&json!({ "article": { "title": "" } }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text();
    assert!(body.contains("target=\"flash\""));
    assert!(body.contains("Validation failed"));
    assert!(body.contains("target=\"form_errors\""));
}

#[tokio::test]
async fn test_destroy_requires_user() {
    let (name, value) = accept("application/json");
    let response = server().delete("/articles/1").add_header(name, value).await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body = response.json::<JsonValue>();
    assert_eq!(body["data"]["success"], false);
    assert_eq!(body["data"]["error"], "You need to sign in first");
}

#[tokio::test]
async fn test_destroy_html_and_stream() {
    let server = server();

    let (name, value) = signed_in();
    let deleted = server.delete("/articles/1").add_header(name, value).await;
    assert_eq!(deleted.status_code(), StatusCode::FOUND);
    assert_eq!(deleted.header("location"), "/articles");
    assert_eq!(deleted.header("x-flash-notice"), "Article deleted");

    let (name, value) = signed_in();
    let (accept_name, accept_value) = accept("text/vnd.turbo-stream.html");
    let streamed = server
        .delete("/articles/2")
        .add_header(name, value)
        .add_header(accept_name, accept_value)
        .await;
    assert_eq!(streamed.status_code(), StatusCode::OK);
    assert!(streamed
        .text()
        .starts_with("<turbo-stream action=\"remove\" target=\"article_2\"></turbo-stream>"));

    let (name, value) = signed_in();
    let missing = server.delete("/articles/2").add_header(name, value).await;
    assert_eq!(missing.status_code(), StatusCode::FOUND);
    assert_eq!(missing.header("x-flash-alert"), "Article not found");
}

#[tokio::test]
async fn test_deeply_nested_form_key_is_bad_request() {
    let body = format!("article{}=x", "%5Bx%5D".repeat(1_000));
    let response = server()
        .post("/articles")
        .content_type("application/x-www-form-urlencoded")
        .bytes(body.into_bytes().into())
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
