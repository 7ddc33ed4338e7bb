use chrono::NaiveDate;
use sea_orm::Order;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Sort direction accepted by the list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn to_order(self) -> Order {
        match self {
            OrderDirection::Asc => Order::Asc,
            OrderDirection::Desc => Order::Desc,
        }
    }
}

/// Relay-style page info returned by the cursor-paginated series endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<String>,
}

/// Encode a day key as an opaque cursor
pub fn cursor_from_date(date: NaiveDate) -> String {
    hex::encode(date.format("%Y-%m-%d").to_string())
}

/// Decode an opaque cursor back into a day key
pub fn date_from_cursor(cursor: &str) -> Result<NaiveDate, String> {
    let bytes = hex::decode(cursor).map_err(|_| format!("Invalid cursor: {}", cursor))?;
    let text = String::from_utf8(bytes).map_err(|_| format!("Invalid cursor: {}", cursor))?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|_| format!("Invalid cursor: {}", cursor))
}

/// Parse a YYYY-MM-DD query parameter
pub fn parse_date_param(value: &str, name: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid {}. Use YYYY-MM-DD", name))
}
