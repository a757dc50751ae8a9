mod accounts;
mod api_keys;
mod balance;
mod commit;
mod entries;
mod security_headers;

use test_helpers::spawn_app;

#[tokio::test]
async fn health_check() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.client.health_check().await?;
    Ok(())
}

#[tokio::test]
async fn service_info() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let info = app.client.service_info().await?;
    assert_eq!(info.name, "ledger-api");
    Ok(())
}
