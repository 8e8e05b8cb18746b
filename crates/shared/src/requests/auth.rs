use serde::{Deserialize, Serialize};

/// Ask for a one-time sign-in code to be e-mailed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCodeBody {
    pub email: String,
}

/// Exchange a sign-in code for a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeBody {
    pub email: String,
    pub code: String,
    /// Display name used when the code creates a new account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
