use std::str::FromStr;

use anyhow::Result;
use reqwest::StatusCode;
use rust_decimal::Decimal;

use payloads::requests::CreateAccount;
use test_helpers::{assert_status_code, spawn_app};

async fn account(app: &test_helpers::TestApp, name: &str) -> Result<payloads::Account> {
    Ok(app
        .client
        .create_account(&CreateAccount { name: name.to_string(), notes: None, initial_balance: None })
        .await?)
}

#[tokio::test]
async fn commit_all_pending_folds_credits_and_debits() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "commit-all").await?;

    app.client.append_credit(&account.id, Decimal::from_str("100")?, None).await?;
    app.client.append_debit(&account.id, Decimal::from_str("40")?, None).await?;

    let view = app.client.commit(&account.id, None).await?;
    assert_eq!(view.committed_balance, Decimal::from_str("60")?);
    assert_eq!(view.pending_balance, view.committed_balance);
    assert_eq!(view.pending_credits.count, 0);
    assert_eq!(view.pending_debits.count, 0);

    let verify = app.client.verify(&account.id).await?;
    assert!(verify.valid);
    Ok(())
}

#[tokio::test]
async fn committing_with_nothing_pending_is_a_noop() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "reanchor").await?;
    app.client.append_credit(&account.id, Decimal::from_str("50")?, None).await?;
    let first = app.client.commit(&account.id, None).await?;

    let second = app.client.commit(&account.id, None).await?;
    assert_eq!(second.committed_balance, first.committed_balance);
    assert_eq!(second.latest_balance_entry_id, first.latest_balance_entry_id);

    let verify = app.client.verify(&account.id).await?;
    assert!(verify.valid);
    Ok(())
}

#[tokio::test]
async fn committed_entry_ids_reflect_only_the_latest_commit() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "layered-commits").await?;

    let first_entry = app
        .client
        .append_credit(&account.id, Decimal::from_str("10")?, None)
        .await?;
    app.client.commit(&account.id, None).await?;

    let second_entry = app
        .client
        .append_credit(&account.id, Decimal::from_str("20")?, None)
        .await?;
    let view = app.client.commit(&account.id, None).await?;

    assert_eq!(view.committed_entry_ids, vec![second_entry.id]);
    assert!(!view.committed_entry_ids.contains(&first_entry.id));
    Ok(())
}

#[tokio::test]
async fn commit_explicit_entries_leaves_others_pending() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "explicit-commit").await?;

    let kept_pending = app
        .client
        .append_credit(&account.id, Decimal::from_str("5")?, None)
        .await?;
    let to_commit = app
        .client
        .append_credit(&account.id, Decimal::from_str("30")?, None)
        .await?;

    let view = app.client.commit(&account.id, Some(vec![to_commit.id])).await?;
    assert_eq!(view.committed_balance, Decimal::from_str("30")?);
    assert_eq!(view.pending_credits.count, 1);
    assert_eq!(view.pending_credits.entries[0].id, kept_pending.id);
    Ok(())
}

#[tokio::test]
async fn committing_an_already_committed_entry_is_a_conflict() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "double-commit").await?;
    let entry = app.client.append_credit(&account.id, Decimal::from_str("10")?, None).await?;
    app.client.commit(&account.id, Some(vec![entry.id])).await?;

    let result = app.client.commit(&account.id, Some(vec![entry.id])).await;
    assert_status_code(result, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn balance_can_go_negative_after_commit() -> Result<()> {
    let app = spawn_app().await;
    let account = account(&app, "overdraft").await?;
    app.client.append_debit(&account.id, Decimal::from_str("75")?, None).await?;

    let view = app.client.commit(&account.id, None).await?;
    assert_eq!(view.committed_balance, Decimal::from_str("-75")?);

    let verify = app.client.verify(&account.id).await?;
    assert!(verify.valid);
    Ok(())
}
