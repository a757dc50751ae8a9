use reqwest::StatusCode;
use serde::Serialize;

use crate::{
    Account, AccountId, ApiKeyCreated, ApiKeyId, ApiKeySummary, BalanceAsOf,
    BalanceView, Entry, EntryId, Page, ServiceInfo, VerifyResult, requests,
    responses,
};

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// A typed client for the ledger HTTP surface (§6). Every request carries a
/// bearer token; `token: None` is only useful against a server running with
/// `auth.enabled = false`.
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
    pub token: Option<String>,
}

impl APIClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            inner_client: reqwest::Client::new(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Helper methods for http actions
impl APIClient {
    fn format_url(&self, path: &str) -> String {
        format!("{}{path}", &self.address)
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get(&self, path: &str) -> ReqwestResult {
        self.auth(self.inner_client.get(self.format_url(path)))
            .send()
            .await
    }

    async fn head(&self, path: &str) -> ReqwestResult {
        self.auth(self.inner_client.head(self.format_url(path)))
            .send()
            .await
    }

    async fn put(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        self.auth(self.inner_client.put(self.format_url(path)).json(body))
            .send()
            .await
    }

    async fn empty_put(&self, path: &str) -> ReqwestResult {
        self.auth(self.inner_client.put(self.format_url(path)))
            .send()
            .await
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        self.auth(self.inner_client.post(self.format_url(path)).json(body))
            .send()
            .await
    }

    async fn empty_post(&self, path: &str) -> ReqwestResult {
        self.auth(self.inner_client.post(self.format_url(path)))
            .send()
            .await
    }

    async fn delete(&self, path: &str) -> ReqwestResult {
        self.auth(self.inner_client.delete(self.format_url(path)))
            .send()
            .await
    }
}

/// Methods on the ledger API
impl APIClient {
    pub async fn service_info(&self) -> Result<ServiceInfo, ClientError> {
        let response = self.get("/").await?;
        ok_body(response).await
    }

    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self.head("/").await?;
        ok_empty(response).await
    }

    // --- Accounts ---

    pub async fn create_account(
        &self,
        details: &requests::CreateAccount,
    ) -> Result<Account, ClientError> {
        let response = self.put("/v1/accounts", details).await?;
        ok_body(response).await
    }

    pub async fn list_accounts(
        &self,
        query: &requests::AccountEnumerationQuery,
    ) -> Result<Page<Account>, ClientError> {
        let mut qs: Vec<(&str, String)> = Vec::new();
        if let Some(v) = query.page.max_results {
            qs.push(("maxResults", v.to_string()));
        }
        if let Some(v) = query.page.skip {
            qs.push(("skip", v.to_string()));
        }
        if let Some(v) = query.page.continuation_token {
            qs.push(("continuationToken", v.to_string()));
        }
        if let Some(v) = query.page.ordering {
            qs.push((
                "ordering",
                serde_json::to_value(v)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
            ));
        }
        if let Some(v) = &query.name_contains {
            qs.push(("nameContains", v.clone()));
        }
        let query_string = qs
            .into_iter()
            .map(|(k, v)| format!("{k}={}", urlencoding_path_segment(&v)))
            .collect::<Vec<_>>()
            .join("&");
        let response =
            self.get(&format!("/v1/accounts?{query_string}")).await?;
        ok_body(response).await
    }

    pub async fn get_account(
        &self,
        id: &AccountId,
    ) -> Result<Account, ClientError> {
        let response = self.get(&format!("/v1/accounts/{id}")).await?;
        ok_body(response).await
    }

    pub async fn get_account_by_name(
        &self,
        name: &str,
    ) -> Result<Account, ClientError> {
        let encoded = urlencoding_path_segment(name);
        let response =
            self.get(&format!("/v1/accounts/byname/{encoded}")).await?;
        ok_body(response).await
    }

    pub async fn account_exists(
        &self,
        id: &AccountId,
    ) -> Result<bool, ClientError> {
        let response = self.head(&format!("/v1/accounts/{id}")).await?;
        Ok(response.status().is_success())
    }

    pub async fn delete_account(
        &self,
        id: &AccountId,
    ) -> Result<(), ClientError> {
        let response = self.delete(&format!("/v1/accounts/{id}")).await?;
        ok_empty(response).await
    }

    // --- Entries ---

    pub async fn append_credit(
        &self,
        account_id: &AccountId,
        amount: rust_decimal::Decimal,
        notes: Option<String>,
    ) -> Result<Entry, ClientError> {
        let body = requests::AppendEntries {
            amount: Some(amount),
            notes,
            entries: None,
        };
        let response =
            self.put(&format!("/v1/accounts/{account_id}/credits"), &body)
                .await?;
        ok_body(response).await
    }

    pub async fn append_credit_batch(
        &self,
        account_id: &AccountId,
        entries: Vec<requests::AppendEntry>,
    ) -> Result<Vec<Entry>, ClientError> {
        let body = requests::AppendEntries {
            amount: None,
            notes: None,
            entries: Some(entries),
        };
        let response =
            self.put(&format!("/v1/accounts/{account_id}/credits"), &body)
                .await?;
        ok_body(response).await
    }

    pub async fn append_debit(
        &self,
        account_id: &AccountId,
        amount: rust_decimal::Decimal,
        notes: Option<String>,
    ) -> Result<Entry, ClientError> {
        let body = requests::AppendEntries {
            amount: Some(amount),
            notes,
            entries: None,
        };
        let response =
            self.put(&format!("/v1/accounts/{account_id}/debits"), &body)
                .await?;
        ok_body(response).await
    }

    pub async fn append_debit_batch(
        &self,
        account_id: &AccountId,
        entries: Vec<requests::AppendEntry>,
    ) -> Result<Vec<Entry>, ClientError> {
        let body = requests::AppendEntries {
            amount: None,
            notes: None,
            entries: Some(entries),
        };
        let response =
            self.put(&format!("/v1/accounts/{account_id}/debits"), &body)
                .await?;
        ok_body(response).await
    }

    pub async fn cancel_entry(
        &self,
        account_id: &AccountId,
        entry_id: &EntryId,
    ) -> Result<(), ClientError> {
        let response = self
            .delete(&format!("/v1/accounts/{account_id}/entries/{entry_id}"))
            .await?;
        ok_empty(response).await
    }

    pub async fn list_entries(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Entry>, ClientError> {
        let response =
            self.get(&format!("/v1/accounts/{account_id}/entries")).await?;
        ok_body(response).await
    }

    pub async fn enumerate_entries(
        &self,
        account_id: &AccountId,
        query: &requests::EntryEnumerationQuery,
    ) -> Result<Page<Entry>, ClientError> {
        let response = self
            .post(
                &format!("/v1/accounts/{account_id}/entries/enumerate"),
                query,
            )
            .await?;
        ok_body(response).await
    }

    pub async fn list_pending(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Entry>, ClientError> {
        let response = self
            .get(&format!("/v1/accounts/{account_id}/entries/pending"))
            .await?;
        ok_body(response).await
    }

    pub async fn list_pending_credits(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Entry>, ClientError> {
        let response = self
            .get(&format!(
                "/v1/accounts/{account_id}/entries/pending/credits"
            ))
            .await?;
        ok_body(response).await
    }

    pub async fn list_pending_debits(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Entry>, ClientError> {
        let response = self
            .get(&format!(
                "/v1/accounts/{account_id}/entries/pending/debits"
            ))
            .await?;
        ok_body(response).await
    }

    // --- Balance ---

    pub async fn get_balance(
        &self,
        account_id: &AccountId,
    ) -> Result<BalanceView, ClientError> {
        let response =
            self.get(&format!("/v1/accounts/{account_id}/balance")).await?;
        ok_body(response).await
    }

    pub async fn get_balance_as_of(
        &self,
        account_id: &AccountId,
        as_of: jiff::Timestamp,
    ) -> Result<BalanceAsOf, ClientError> {
        let response = self
            .get(&format!(
                "/v1/accounts/{account_id}/balance/asof?asOf={as_of}"
            ))
            .await?;
        ok_body(response).await
    }

    pub async fn get_all_balances(
        &self,
    ) -> Result<Vec<BalanceView>, ClientError> {
        let response = self.get("/v1/balances").await?;
        ok_body(response).await
    }

    pub async fn commit(
        &self,
        account_id: &AccountId,
        entry_guids: Option<Vec<EntryId>>,
    ) -> Result<BalanceView, ClientError> {
        let body = requests::Commit { entry_guids };
        let response = self
            .post(&format!("/v1/accounts/{account_id}/commit"), &body)
            .await?;
        ok_body(response).await
    }

    pub async fn verify(
        &self,
        account_id: &AccountId,
    ) -> Result<VerifyResult, ClientError> {
        let response =
            self.get(&format!("/v1/accounts/{account_id}/verify")).await?;
        ok_body(response).await
    }

    // --- API keys (admin) ---

    pub async fn list_api_keys(
        &self,
    ) -> Result<Vec<ApiKeySummary>, ClientError> {
        let response = self.get("/v1/apikeys").await?;
        ok_body(response).await
    }

    pub async fn create_api_key(
        &self,
        details: &requests::CreateApiKey,
    ) -> Result<ApiKeyCreated, ClientError> {
        let response = self.put("/v1/apikeys", details).await?;
        ok_body(response).await
    }

    pub async fn revoke_api_key(
        &self,
        id: &ApiKeyId,
    ) -> Result<responses::ApiKeyRevoked, ClientError> {
        let response = self.delete(&format!("/v1/apikeys/{id}")).await?;
        ok_body(response).await
    }
}

fn urlencoding_path_segment(s: &str) -> String {
    // Avoid depending on a URL-encoding crate for this one call site: the
    // ledger's account names are the only path segment that needs escaping,
    // and reqwest/actix-web both treat `%XX` escapes per RFC 3986.
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.'
            | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An unhandled API error to display, containing response text.
    #[error("{1}")]
    APIError(StatusCode, String),
    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(response.json::<T>().await?)
}

/// Check that an empty response is OK, returning a ClientError if not.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(())
}
