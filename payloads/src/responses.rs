//! Response envelopes that wrap the core domain types from the crate root
//! (`Account`, `Entry`, `BalanceView`, ...) for shapes that don't map
//! one-to-one onto them.

use serde::{Deserialize, Serialize};

use crate::ApiKeyId;

/// `DELETE /v1/apikeys/{id}` and `DELETE /v1/accounts/{id}` return this
/// empty acknowledgement on success.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub deleted: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exists {
    pub exists: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRevoked {
    pub id: ApiKeyId,
    pub revoked: bool,
}
