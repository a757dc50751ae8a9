use std::str::FromStr;

use anyhow::Result;
use reqwest::StatusCode;
use rust_decimal::Decimal;

use payloads::requests::{AccountEnumerationQuery, CreateAccount, EnumerationQuery};
use test_helpers::{assert_status_code, spawn_app};

fn new_account(name: &str) -> CreateAccount {
    CreateAccount { name: name.to_string(), notes: None, initial_balance: None }
}

#[tokio::test]
async fn create_and_fetch_account() -> Result<()> {
    let app = spawn_app().await;

    let created = app.client.create_account(&new_account("checking")).await?;
    assert_eq!(created.name, "checking");
    assert!(created.notes.is_none());

    let fetched = app.client.get_account(&created.id).await?;
    assert_eq!(fetched, created);

    let by_name = app.client.get_account_by_name("checking").await?;
    assert_eq!(by_name, created);

    assert!(app.client.account_exists(&created.id).await?);
    Ok(())
}

#[tokio::test]
async fn duplicate_account_name_is_rejected() -> Result<()> {
    let app = spawn_app().await;

    app.client.create_account(&new_account("savings")).await?;
    let result = app.client.create_account(&new_account("savings")).await;
    assert_status_code(result, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn create_account_with_genesis_balance() -> Result<()> {
    let app = spawn_app().await;

    let account = app
        .client
        .create_account(&CreateAccount {
            name: "opening-balance".to_string(),
            notes: None,
            initial_balance: Some(Decimal::from_str("150.25")?),
        })
        .await?;

    let balance = app.client.get_balance(&account.id).await?;
    assert_eq!(balance.committed_balance, Decimal::from_str("150.25")?);
    assert_eq!(balance.pending_balance, balance.committed_balance);
    assert!(balance.latest_balance_entry_id.is_some());
    Ok(())
}

#[tokio::test]
async fn get_unknown_account_is_not_found() -> Result<()> {
    let app = spawn_app().await;
    let result = app.client.get_account(&payloads::AccountId(uuid::Uuid::new_v4())).await;
    assert_status_code(result, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_account_removes_its_history() -> Result<()> {
    let app = spawn_app().await;
    let account = app.client.create_account(&new_account("to-delete")).await?;
    app.client.append_credit(&account.id, Decimal::from_str("10")?, None).await?;

    app.client.delete_account(&account.id).await?;

    let result = app.client.get_account(&account.id).await;
    assert_status_code(result, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn list_accounts_paginates_and_filters_by_name() -> Result<()> {
    let app = spawn_app().await;
    app.client.create_account(&new_account("alpha")).await?;
    app.client.create_account(&new_account("beta")).await?;
    app.client.create_account(&new_account("alphabet")).await?;

    let page = app
        .client
        .list_accounts(&AccountEnumerationQuery {
            page: EnumerationQuery { max_results: Some(1), ..Default::default() },
            name_contains: None,
        })
        .await?;
    assert_eq!(page.total_records, 3);
    assert_eq!(page.objects.len(), 1);
    assert!(!page.end_of_results);
    assert!(page.continuation_token.is_some());

    let filtered = app
        .client
        .list_accounts(&AccountEnumerationQuery {
            page: EnumerationQuery::default(),
            name_contains: Some("alpha".to_string()),
        })
        .await?;
    assert_eq!(filtered.total_records, 2);
    Ok(())
}
