use std::str::FromStr;

use anyhow::Result;
use jiff::Span;
use rust_decimal::Decimal;

use payloads::requests::CreateAccount;
use test_helpers::spawn_app;

async fn account(app: &test_helpers::TestApp, name: &str) -> Result<payloads::Account> {
    Ok(app
        .client
        .create_account(&CreateAccount { name: name.to_string(), notes: None, initial_balance: None })
        .await?)
}

#[tokio::test]
async fn balance_as_of_reflects_only_entries_committed_by_then() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "timeline").await?;

    let before_first_commit = app.time_source.now();
    app.client.append_credit(&account.id, Decimal::from_str("10")?, None).await?;
    app.client.commit(&account.id, None).await?;
    app.time_source.advance(Span::new().hours(1));

    let midpoint = app.time_source.now();
    app.client.append_credit(&account.id, Decimal::from_str("40")?, None).await?;
    app.client.commit(&account.id, None).await?;

    let as_of_before = app.client.get_balance_as_of(&account.id, before_first_commit).await?;
    assert_eq!(as_of_before.amount, Decimal::from_str("0")?);

    let as_of_mid = app.client.get_balance_as_of(&account.id, midpoint).await?;
    assert_eq!(as_of_mid.amount, Decimal::from_str("10")?);

    let as_of_now = app.client.get_balance_as_of(&account.id, app.time_source.now()).await?;
    assert_eq!(as_of_now.amount, Decimal::from_str("50")?);
    Ok(())
}

#[tokio::test]
async fn get_all_balances_includes_every_account() -> Result<()> {
    let app = spawn_app().await;
    account(&app, "first").await?;
    account(&app, "second").await?;

    let balances = app.client.get_all_balances().await?;
    assert_eq!(balances.len(), 2);
    Ok(())
}
