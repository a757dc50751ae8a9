use anyhow::Result;
use reqwest::StatusCode;

use payloads::requests::CreateApiKey;
use test_helpers::{assert_status_code, spawn_app, spawn_app_with_auth};

#[tokio::test]
async fn admin_can_create_list_and_revoke_keys() -> Result<()> {
    let app = spawn_app_with_auth().await;

    let created = app
        .client
        .create_api_key(&CreateApiKey { label: "ci".to_string(), is_admin: false })
        .await?;
    assert_eq!(created.summary.label, "ci");
    assert!(!created.token.is_empty());

    let keys = app.client.list_api_keys().await?;
    assert!(keys.iter().any(|k| k.id == created.summary.id));

    let revoked = app.client.revoke_api_key(&created.summary.id).await?;
    assert!(revoked.revoked);
    Ok(())
}

#[tokio::test]
async fn non_admin_key_cannot_manage_keys() -> Result<()> {
    let app = spawn_app_with_auth().await;
    let created = app
        .client
        .create_api_key(&CreateApiKey { label: "read-only".to_string(), is_admin: false })
        .await?;

    let member_client = payloads::APIClient::new(app.client.address.clone())
        .with_token(created.token);
    let result = member_client.list_api_keys().await;
    assert_status_code(result, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() -> Result<()> {
    let app = spawn_app_with_auth().await;
    let anonymous = payloads::APIClient::new(app.client.address.clone());
    let result = anonymous.list_api_keys().await;
    assert_status_code(result, StatusCode::UNAUTHORIZED);
    Ok(())
}
