use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Metric families bucketed per (date, dao)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    TotalSupply,
    DelegatedSupply,
    TransferVolume,
    Treasury,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::TotalSupply => "TOTAL_SUPPLY",
            MetricType::DelegatedSupply => "DELEGATED_SUPPLY",
            MetricType::TransferVolume => "TRANSFER_VOLUME",
            MetricType::Treasury => "TREASURY",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "TOTAL_SUPPLY" => Some(MetricType::TotalSupply),
            "DELEGATED_SUPPLY" => Some(MetricType::DelegatedSupply),
            "TRANSFER_VOLUME" => Some(MetricType::TransferVolume),
            "TREASURY" => Some(MetricType::Treasury),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucketQuery {
    pub dao_id: String,
    pub metric_type: String,
    /// YYYY-MM-DD, inclusive
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucketEntry {
    pub date: NaiveDate,
    pub dao_id: String,
    pub token_id: String,
    pub metric_type: String,
    pub open: Decimal,
    pub close: Decimal,
    pub low: Decimal,
    pub high: Decimal,
    pub average: Decimal,
    pub volume: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucketsResponse {
    pub items: Vec<DayBucketEntry>,
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_type_round_trip() {
        for metric in [
            MetricType::TotalSupply,
            MetricType::DelegatedSupply,
            MetricType::TransferVolume,
            MetricType::Treasury,
        ] {
            assert_eq!(MetricType::from_str_opt(metric.as_str()), Some(metric));
        }
        assert_eq!(MetricType::from_str_opt("NOT_A_METRIC"), None);
    }
}
