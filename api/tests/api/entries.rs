use std::str::FromStr;

use anyhow::Result;
use reqwest::StatusCode;
use rust_decimal::Decimal;

use payloads::requests::{AppendEntry, CreateAccount};
use payloads::EntryKind;
use test_helpers::{assert_status_code, spawn_app};

async fn account(app: &test_helpers::TestApp, name: &str) -> Result<payloads::Account> {
    Ok(app
        .client
        .create_account(&CreateAccount { name: name.to_string(), notes: None, initial_balance: None })
        .await?)
}

#[tokio::test]
async fn append_single_credit_and_debit() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "wallet").await?;

    let credit = app
        .client
        .append_credit(&account.id, Decimal::from_str("25.50")?, Some("paycheck".to_string()))
        .await?;
    assert_eq!(credit.kind, EntryKind::Credit);
    assert!(!credit.is_committed);

    let debit = app
        .client
        .append_debit(&account.id, Decimal::from_str("5.00")?, None)
        .await?;
    assert_eq!(debit.kind, EntryKind::Debit);

    let pending = app.client.list_pending(&account.id).await?;
    assert_eq!(pending.len(), 2);
    Ok(())
}

#[tokio::test]
async fn append_batch_of_credits() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "batch-wallet").await?;

    let entries = app
        .client
        .append_credit_batch(
            &account.id,
            vec![
                AppendEntry { amount: Decimal::from_str("10")?, notes: None },
                AppendEntry { amount: Decimal::from_str("20")?, notes: None },
            ],
        )
        .await?;
    assert_eq!(entries.len(), 2);

    let credits = app.client.list_pending_credits(&account.id).await?;
    assert_eq!(credits.len(), 2);
    let debits = app.client.list_pending_debits(&account.id).await?;
    assert!(debits.is_empty());
    Ok(())
}

#[tokio::test]
async fn negative_amounts_are_rejected() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "guard").await?;
    let result = app.client.append_credit(&account.id, Decimal::from_str("-1")?, None).await;
    assert_status_code(result, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn cancel_pending_entry_removes_it() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "cancel-me").await?;
    let entry = app.client.append_credit(&account.id, Decimal::from_str("100")?, None).await?;

    app.client.cancel_entry(&account.id, &entry.id).await?;

    let pending = app.client.list_pending(&account.id).await?;
    assert!(pending.is_empty());
    Ok(())
}

#[tokio::test]
async fn cancel_committed_entry_is_a_conflict() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "locked").await?;
    let entry = app.client.append_credit(&account.id, Decimal::from_str("100")?, None).await?;
    app.client.commit(&account.id, None).await?;

    let result = app.client.cancel_entry(&account.id, &entry.id).await;
    assert_status_code(result, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn enumerate_entries_excludes_balance_entries_by_default() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "enumerated").await?;
    app.client.append_credit(&account.id, Decimal::from_str("10")?, None).await?;
    app.client.commit(&account.id, None).await?;

    let page = app
        .client
        .enumerate_entries(&account.id, &Default::default())
        .await?;
    assert_eq!(page.total_records, 1);
    assert!(page.objects.iter().all(|e| e.kind != EntryKind::Balance));
    Ok(())
}
