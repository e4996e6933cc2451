mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn first_tariff_becomes_default_and_cannot_be_deleted() -> Result<()> {
    let app = common::TestApp::new();
    let token = app.user_session("+79991234567").await?;
    let second = app.post("/pub/tariffs", None, json!({"name": "Premium"})).await?;

    let settings = app.get("/prot/settings", &token).await?;
    assert_eq!(settings.status, StatusCode::OK);
    let default_id = settings.body["default_tariff_id"].as_i64().unwrap();
    assert_ne!(Some(default_id), second.body["id"].as_i64());

    let res = app
        .send(Method::DELETE, &format!("/prot/tariffs/{}", default_id), Some(&token), None)
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .send(Method::DELETE, &format!("/prot/tariffs/{}", second.body["id"]), Some(&token), None)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], second.body["id"]);
    Ok(())
}

#[tokio::test]
async fn catalog_entries_can_be_listed_and_renamed() -> Result<()> {
    let app = common::TestApp::new();
    let token = app.user_session("+79991234567").await?;
    let offering = app.post("/pub/services", None, json!({"name": "Repair"})).await?;
    assert_eq!(offering.status, StatusCode::CREATED);

    let uri = format!("/prot/services/{}", offering.body["id"]);
    let res = app.send(Method::PUT, &uri, Some(&token), Some(json!({"name": "Hardware repair"}))).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Hardware repair");

    let res = app.get("/prot/services", &token).await?;
    assert_eq!(res.body.as_array().map(Vec::len), Some(1));

    let res = app.post("/pub/roles", None, json!({"name": "   "})).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.get("/prot/roles/0", &token).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.get("/prot/roles/42", &token).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn storage_failures_are_internal_errors_without_details() -> Result<()> {
    let app = common::TestApp::new();
    let token = app.user_session("+79991234567").await?;
    app.mem.fail("role").await;

    let res = app.get("/prot/roles", &token).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["error"], "An error occurred while processing your request");
    assert_eq!(res.body["path"], "/prot/roles");
    Ok(())
}
