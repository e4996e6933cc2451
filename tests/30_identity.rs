mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

fn signup(phone: &str, email: &str, password: &str) -> serde_json::Value {
    json!({
        "name": "Anna",
        "last_name": "Petrova",
        "email": email,
        "phone": phone,
        "password": password
    })
}

#[tokio::test]
async fn user_signup_normalizes_phone_and_hides_the_hash() -> Result<()> {
    let app = common::TestApp::new();
    let tariff = app.post("/pub/tariffs", None, json!({"name": "Basic"})).await?;

    let res = app
        .post("/pub/users/signup", None, signup("8 (999) 123-45-67", "anna@example.com", "secret1"))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["phone"], "+79991234567");
    assert_eq!(res.body["tariff_id"], tariff.body["id"]);
    assert!(res.body.get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn signup_rejections_map_to_client_errors() -> Result<()> {
    let app = common::TestApp::new();

    // No default tariff yet
    let res = app
        .post("/pub/users/signup", None, signup("9991234567", "anna@example.com", "secret1"))
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    app.post("/pub/tariffs", None, json!({"name": "Basic"})).await?;

    let res = app
        .post("/pub/users/signup", None, signup("9991234567", "anna@example.com", "abcdefg"))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post("/pub/users/signup", None, signup("9991234567", "not-an-email", "secret1"))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .send(Method::POST, "/pub/users/signup", None, Some(json!({"name": "Anna"})))
        .await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["path"], "/pub/users/signup");
    Ok(())
}

#[tokio::test]
async fn duplicate_phone_conflicts() -> Result<()> {
    let app = common::TestApp::new();
    app.user_session("+79991234567").await?;

    let res = app
        .post("/pub/users/signup", None, signup("89991234567", "second@example.com", "secret1"))
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn signin_failures() -> Result<()> {
    let app = common::TestApp::new();
    app.user_session("+79991234567").await?;

    let res = app
        .post("/pub/users/signin", None, json!({"phone": "+79991234567", "password": "wrong12"}))
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .post("/pub/users/signin", None, json!({"phone": "+79990000000", "password": "secret1"}))
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .post("/pub/employee/signin", None, json!({"email": "nobody@example.com", "password": "secret1"}))
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn employees_carry_role_and_specialties() -> Result<()> {
    let app = common::TestApp::new();
    let (employee_id, token) = app.employee_session("ivan@example.com").await?;
    let offering = app.post("/pub/services", None, json!({"name": "Consulting"})).await?;

    let res = app
        .post(
            &format!("/prot/employee/{}/service", employee_id),
            Some(&token),
            json!({"service_id": offering.body["id"]}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["services"][0]["name"], "Consulting");

    let res = app.get("/prot/employee", &token).await?;
    assert_eq!(res.body[0]["role"]["name"], "operator");
    assert_eq!(res.body[0]["services"].as_array().map(Vec::len), Some(1));

    let uri = format!("/prot/employee/{}/service/{}", employee_id, offering.body["id"]);
    let res = app.send(Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.get(&format!("/prot/employee/{}", employee_id), &token).await?;
    assert_eq!(res.body["services"], json!([]));

    let res = app.get("/prot/employee/abc", &token).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}
