mod common;

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::{read_json, TestApp};

#[tokio::test]
async fn creating_a_district_returns_the_resource_and_location() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/districts",
            Some(json!({ "district_name": "Harbor" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("location header");
    let created = read_json(response).await;

    let district_id = created["district_id"].as_i64().expect("district id");
    assert_eq!(location, format!("/districts/{}", district_id));
    assert_eq!(created["district_name"].as_str(), Some("Harbor"));

    let response = app.request(Method::GET, "/districts", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = read_json(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["district_name"].as_str(), Some("Harbor"));
}

#[tokio::test]
async fn district_name_is_optional() {
    let app = TestApp::new().await;

    let response = app.request(Method::POST, "/districts", Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    assert!(created["district_name"].is_null());
}

#[tokio::test]
async fn updating_a_district_changes_the_name_and_preserves_the_id() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/districts",
            Some(json!({ "district_name": "Old Town" })),
        )
        .await;
    let created = read_json(response).await;
    let district_id = created["district_id"].as_i64().unwrap();

    let response = app
        .request(
            Method::PUT,
            &format!("/districts?id={}", district_id),
            Some(json!({ "district_id": district_id, "district_name": "New Town" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let listed = read_json(app.request(Method::GET, "/districts", None).await).await;
    assert_eq!(listed[0]["district_id"].as_i64(), Some(district_id));
    assert_eq!(listed[0]["district_name"].as_str(), Some("New Town"));
}

#[tokio::test]
async fn updating_a_district_can_overwrite_the_id() {
    let app = TestApp::new().await;

    let created = read_json(
        app.request(
            Method::POST,
            "/districts",
            Some(json!({ "district_name": "Docks" })),
        )
        .await,
    )
    .await;
    let district_id = created["district_id"].as_i64().unwrap();
    let new_id = district_id + 100;

    let response = app
        .request(
            Method::PUT,
            &format!("/districts?id={}", district_id),
            Some(json!({ "district_id": new_id, "district_name": "Docks" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let listed = read_json(app.request(Method::GET, "/districts", None).await).await;
    assert_eq!(listed[0]["district_id"].as_i64(), Some(new_id));
}

#[tokio::test]
async fn updating_a_missing_district_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PUT,
            "/districts?id=9999",
            Some(json!({ "district_id": 9999, "district_name": "Nowhere" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_district_makes_later_lookups_not_found() {
    let app = TestApp::new().await;

    let created = read_json(
        app.request(
            Method::POST,
            "/districts",
            Some(json!({ "district_name": "Ephemeral" })),
        )
        .await,
    )
    .await;
    let district_id = created["district_id"].as_i64().unwrap();

    let response = app
        .request(Method::DELETE, &format!("/districts/{}", district_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let listed = read_json(app.request(Method::GET, "/districts", None).await).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));

    let response = app
        .request(Method::DELETE, &format!("/districts/{}", district_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
