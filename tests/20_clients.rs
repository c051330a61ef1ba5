mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{client_body, read, spawn_app};

#[tokio::test]
async fn sales_creates_client_as_owner() -> Result<()> {
    let app = spawn_app().await?;
    let sales = app.session("sales1").await?;

    let mut body = client_body("idilbi");
    body["sales_contact"] = json!(999);
    let (status, created) = read(sales.post("/clients", &body).await?).await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["sales_contact"], sales.id);
    assert_eq!(created["data"]["last_name"], "idilbi");
    assert!(created["data"]["date_created"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn support_cannot_create_or_update_clients() -> Result<()> {
    let app = spawn_app().await?;
    let sales = app.session("sales1").await?;
    let support = app.session("support1").await?;
    let client = sales.create_client("idilbi").await?;

    let (status, body) = read(support.post("/clients", &client_body("other")).await?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You are not allowed.");
    assert_eq!(body["code"], "GRANT_DENIED");

    let (status, body) = read(support.put(&format!("/clients/{}", client), &client_body("x")).await?).await?;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], "You are not allowed because you are not a sales member.");
    Ok(())
}

#[tokio::test]
async fn other_sales_member_is_not_the_owner() -> Result<()> {
    let app = spawn_app().await?;
    let a = app.session("sales1").await?;
    let b = app.session("sales2").await?;
    let client = a.create_client("idilbi").await?;
    let path = format!("/clients/{}", client);

    let (status, body) = read(b.put(&path, &client_body("hijack")).await?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "OWNERSHIP_DENIED");
    assert_eq!(
        body["message"],
        "You're not allowed because you're not the sales contact of the client."
    );

    // Nothing was written
    let (_, detail) = read(a.get(&path).await?).await?;
    assert_eq!(detail["data"]["last_name"], "idilbi");
    Ok(())
}

#[tokio::test]
async fn owner_updates_and_repeating_is_stable() -> Result<()> {
    let app = spawn_app().await?;
    let sales = app.session("sales1").await?;
    let client = sales.create_client("idilbi").await?;
    let path = format!("/clients/{}", client);

    let mut body = client_body("idilbi");
    body["company_name"] = json!("company three");

    let (first_status, first) = read(sales.put(&path, &body).await?).await?;
    let (second_status, second) = read(sales.put(&path, &body).await?).await?;
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first["data"]["company_name"], "company three");
    Ok(())
}

#[tokio::test]
async fn update_of_missing_client_is_not_found() -> Result<()> {
    let app = spawn_app().await?;
    let sales = app.session("sales1").await?;

    let (status, body) = read(sales.put("/clients/4242", &client_body("x")).await?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not found.");

    let (status, _) = read(sales.get("/clients/not-a-number").await?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn invalid_payload_is_rejected_after_authorization() -> Result<()> {
    let app = spawn_app().await?;
    let sales = app.session("sales1").await?;

    let mut body = client_body("idilbi");
    body["first_name"] = json!("");
    body["email"] = json!("x".repeat(101));
    let (status, err) = read(sales.post("/clients", &body).await?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION_ERROR");
    assert!(err["field_errors"]["first_name"].is_string());
    assert!(err["field_errors"]["email"].is_string());

    let (status, err) = read(sales.post_raw("/clients", "{not json").await?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn detail_lists_linked_records() -> Result<()> {
    let app = spawn_app().await?;
    let sales = app.session("sales1").await?;
    let support = app.session("support1").await?;
    let client = sales.create_client("idilbi").await?;
    let contract = sales.create_contract(client, true).await?;
    let event = sales.create_event(client, support.id).await?;

    let (status, body) = read(sales.get(&format!("/clients/{}", client)).await?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["contracts"], json!([contract]));
    assert_eq!(body["data"]["events"], json!([event]));
    Ok(())
}

#[tokio::test]
async fn principal_without_team_has_no_grants() -> Result<()> {
    let app = spawn_app().await?;
    let manager = app.session("manager").await?;

    let (status, body) = read(manager.post("/clients", &client_body("idilbi")).await?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You are not allowed.");
    Ok(())
}
