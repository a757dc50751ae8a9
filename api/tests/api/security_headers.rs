use anyhow::Result;

use payloads::requests::{AccountEnumerationQuery, EnumerationQuery};
use test_helpers::spawn_app;

#[tokio::test]
async fn v1_endpoints_carry_no_cache_headers() -> Result<()> {
    let app = spawn_app().await;
    app.client
        .list_accounts(&AccountEnumerationQuery {
            page: EnumerationQuery::default(),
            name_contains: None,
        })
        .await?;

    let url = format!("{}/v1/accounts", app.client.address);
    let response = app.client.inner_client.get(&url).send().await?;
    let headers = response.headers();

    let cache_control = headers
        .get("cache-control")
        .expect("Cache-Control header should be present")
        .to_str()?;
    assert!(cache_control.contains("no-store"));
    assert!(cache_control.contains("no-cache"));
    assert!(cache_control.contains("must-revalidate"));
    assert!(cache_control.contains("private"));

    assert_eq!(headers.get("pragma").expect("Pragma header should be present"), "no-cache");
    assert_eq!(headers.get("expires").expect("Expires header should be present"), "0");
    Ok(())
}

#[tokio::test]
async fn root_endpoints_do_not_carry_security_headers() -> Result<()> {
    let app = spawn_app().await;

    let url = format!("{}/", app.client.address);
    let response = app.client.inner_client.get(&url).send().await?;
    let headers = response.headers();

    assert!(headers.get("cache-control").is_none());
    assert!(headers.get("pragma").is_none());
    assert!(headers.get("expires").is_none());
    Ok(())
}

#[tokio::test]
async fn correlation_id_is_echoed_or_minted() -> Result<()> {
    let app = spawn_app().await;

    let url = format!("{}/", app.client.address);
    let response = app.client.inner_client.get(&url).send().await?;
    assert!(response.headers().get("x-correlation-id").is_some());

    let caller_id = "caller-supplied-id";
    let response = app
        .client
        .inner_client
        .get(&url)
        .header("x-correlation-id", caller_id)
        .send()
        .await?;
    assert_eq!(response.headers().get("x-correlation-id").unwrap(), caller_id);
    Ok(())
}
