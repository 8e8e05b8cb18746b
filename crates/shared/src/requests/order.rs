use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    /// Minutes until the order should be ready (1..=1440).
    pub time_in_minutes: i64,
    #[serde(default)]
    pub name: Option<String>,
}
