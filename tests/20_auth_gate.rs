mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn missing_token_is_a_bad_request() -> Result<()> {
    let app = common::TestApp::new();

    let res = app.send(Method::GET, "/prot/users", None, None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["path"], "/prot/users");
    assert!(res.body["error"].as_str().unwrap().contains("Authorization"));
    Ok(())
}

#[tokio::test]
async fn forged_or_expired_tokens_are_unauthorized() -> Result<()> {
    let app = common::TestApp::new();

    let res = app.get("/prot/users", "not.a.jwt").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let foreign = service_desk::auth::TokenIssuer::new(
        "some-other-secret",
        chrono::Duration::hours(1),
        chrono::Duration::days(7),
    )?
    .issue_pair(1, None)?;
    let res = app.get("/prot/users", &foreign.access_token).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let expired = service_desk::auth::TokenIssuer::new(common::SECRET, chrono::Duration::seconds(-60), chrono::Duration::days(7))?
        .issue_pair(1, None)?;
    let res = app.get("/prot/users", &expired.access_token).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn whoami_reflects_the_token_claims() -> Result<()> {
    let app = common::TestApp::new();
    let (employee_id, token) = app.employee_session("ivan@example.com").await?;

    let res = app.get("/prot/auth/whoami", &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], employee_id);
    assert!(res.body["role_id"].is_number());
    Ok(())
}

#[tokio::test]
async fn refresh_issues_a_new_pair_for_the_same_subject() -> Result<()> {
    let app = common::TestApp::new();
    let access = app.user_session("+79991234567").await?;
    let pair = app
        .post("/pub/users/signin", None, json!({"phone": "89991234567", "password": "secret1"}))
        .await?;
    let refresh_token = pair.body["refresh_token"].as_str().unwrap().to_string();

    let res = app
        .post("/prot/auth/refresh", Some(&access), json!({"refresh_token": refresh_token}))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    let claims = app.tokens.verify(res.body["access_token"].as_str().unwrap())?;
    assert_eq!(claims.sub, app.tokens.verify(&access)?.sub);
    assert_eq!(claims.role, None);

    let res = app
        .post("/prot/auth/refresh", Some(&access), json!({"refresh_token": "garbage"}))
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_cannot_cross_from_user_to_employee() -> Result<()> {
    let app = common::TestApp::new();
    let user_access = app.user_session("+79991234567").await?;
    app.employee_session("ivan@example.com").await?;
    let employee = app
        .post("/pub/employee/signin", None, json!({"email": "ivan@example.com", "password": "secret1"}))
        .await?;

    // Both identities are id 1 in their own tables
    assert_eq!(app.tokens.verify(&user_access)?.sub, 1);
    let employee_refresh = employee.body["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(app.tokens.verify(&employee_refresh)?.sub, 1);

    let res = app
        .post("/prot/auth/refresh", Some(&user_access), json!({"refresh_token": employee_refresh}))
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}
