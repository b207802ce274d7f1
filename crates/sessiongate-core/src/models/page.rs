use serde::{Deserialize, Serialize};

/// Public landing page payload (`GET /home`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct HomeData {
    pub message: String,
    pub description: String,
}

/// Protected page payload (`GET /service`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ServiceData {
    pub message: String,
    pub description: String,
    pub user_id: String,
}
