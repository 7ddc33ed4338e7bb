//! Day bucket aggregation
//!
//! Compresses the ledgers into daily OHLC-style buckets per metric and
//! provides the forward-fill used to densify sparse daily series.
//! Buckets are a derived cache over the ledgers: rebuilding them is
//! idempotent and may run at any time.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use std::collections::BTreeMap;
use tracing::info;

use crate::entities::{dao_metrics_day_bucket, prelude::*, transfers, voting_power_history};
use crate::models::day_bucket::MetricType;
use crate::services::normalizer::ZERO_ADDRESS;

#[derive(Debug)]
pub enum DayBucketError {
    DatabaseError(String),
}

impl std::fmt::Display for DayBucketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayBucketError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DayBucketError {}

/// Carry the last known value of a sparse daily series forward over a
/// dense timeline.
///
/// The timeline runs from `start` (or the earliest known data point when
/// `start` is None) up to `until` inclusive, one day per step. Days
/// before the first known value are omitted unless `initial` seeds the
/// walk; gaps are never back-filled or numerically interpolated.
pub fn forward_fill(
    sparse: &BTreeMap<NaiveDate, Decimal>,
    start: Option<NaiveDate>,
    until: NaiveDate,
    initial: Option<Decimal>,
) -> BTreeMap<NaiveDate, Decimal> {
    let mut filled = BTreeMap::new();
    let Some(first) = start.or_else(|| sparse.keys().next().copied()) else {
        // no data points and no explicit start: nothing to emit
        return filled;
    };

    let mut last_known = initial;
    let mut day = first;
    while day <= until {
        if let Some(value) = sparse.get(&day) {
            last_known = Some(*value);
        }
        if let Some(value) = last_known {
            filled.insert(day, value);
        }
        day += Duration::days(1);
    }
    filled
}

/// Compose the daily treasury value from a USD price series, the
/// governance token quantity held, and non-token asset valuations.
///
/// The price series is the anchor: a day exists in the output only if a
/// price exists for it. Quantities or non-token values missing for an
/// anchored day count as zero for that day rather than being carried
/// forward, because the anchor decides which days are real.
pub fn compose_treasury(
    prices: &BTreeMap<NaiveDate, Decimal>,
    gov_token_qty: &BTreeMap<NaiveDate, Decimal>,
    non_token_assets: &BTreeMap<NaiveDate, Decimal>,
) -> BTreeMap<NaiveDate, Decimal> {
    prices
        .iter()
        .map(|(day, price)| {
            let qty = gov_token_qty.get(day).copied().unwrap_or(Decimal::ZERO);
            let other = non_token_assets.get(day).copied().unwrap_or(Decimal::ZERO);
            (*day, *price * qty + other)
        })
        .collect()
}

/// OHLC summary over the in-day sequence of observed values
#[derive(Debug, Clone, PartialEq)]
pub struct Ohlc {
    pub open: Decimal,
    pub close: Decimal,
    pub low: Decimal,
    pub high: Decimal,
    pub average: Decimal,
}

pub fn ohlc(values: &[Decimal]) -> Option<Ohlc> {
    let first = values.first()?;
    let last = values.last()?;
    let mut low = *first;
    let mut high = *first;
    let mut sum = Decimal::ZERO;
    for value in values {
        low = low.min(*value);
        high = high.max(*value);
        sum += *value;
    }
    Some(Ohlc {
        open: *first,
        close: *last,
        low,
        high,
        average: sum / Decimal::from(values.len()),
    })
}

#[derive(Debug, Default)]
pub struct RebuildStats {
    pub buckets_written: usize,
    pub buckets_deleted: u64,
}

/// In-day observations for one (date, metric) key
#[derive(Debug, Default)]
struct DayObservations {
    values: Vec<Decimal>,
    volume: Decimal,
}

pub struct DayBucketAggregator {
    db: DatabaseConnection,
}

impl DayBucketAggregator {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recompute the ledger-derived buckets for one DAO from scratch, up
    /// to `until` (UTC day, inclusive). Deletes the affected keys and
    /// reinserts them, so reruns converge to the same rows.
    pub async fn rebuild_dao(
        &self,
        dao_id: &str,
        token_id: &str,
        until: NaiveDate,
    ) -> Result<RebuildStats, DayBucketError> {
        info!(dao_id = %dao_id, until = %until, "Rebuilding day buckets");

        let mut stats = RebuildStats::default();

        let supply_days = self.total_supply_observations(dao_id, until).await?;
        let delegated_days = self.delegated_supply_observations(dao_id, until).await?;
        let volume_days = self.transfer_volume_observations(dao_id, until).await?;

        let rebuilt_metrics = [
            MetricType::TotalSupply,
            MetricType::DelegatedSupply,
            MetricType::TransferVolume,
        ];
        let deleted = dao_metrics_day_bucket::Entity::delete_many()
            .filter(dao_metrics_day_bucket::Column::DaoId.eq(dao_id))
            .filter(
                dao_metrics_day_bucket::Column::MetricType
                    .is_in(rebuilt_metrics.iter().map(|m| m.as_str())),
            )
            .exec(&self.db)
            .await
            .map_err(|e| DayBucketError::DatabaseError(format!("Delete failed: {}", e)))?;
        stats.buckets_deleted = deleted.rows_affected;

        for (metric, days) in [
            (MetricType::TotalSupply, supply_days),
            (MetricType::DelegatedSupply, delegated_days),
            (MetricType::TransferVolume, volume_days),
        ] {
            for (date, observations) in days {
                let Some(summary) = ohlc(&observations.values) else {
                    continue;
                };
                let bucket = dao_metrics_day_bucket::ActiveModel {
                    date: Set(date),
                    dao_id: Set(dao_id.to_string()),
                    token_id: Set(token_id.to_string()),
                    metric_type: Set(metric.as_str().to_string()),
                    open: Set(summary.open),
                    close: Set(summary.close),
                    low: Set(summary.low),
                    high: Set(summary.high),
                    average: Set(summary.average),
                    volume: Set(observations.volume),
                    count: Set(observations.values.len() as i64),
                    ..Default::default()
                };
                bucket
                    .insert(&self.db)
                    .await
                    .map_err(|e| DayBucketError::DatabaseError(format!("Insert failed: {}", e)))?;
                stats.buckets_written += 1;
            }
        }

        info!(
            dao_id = %dao_id,
            written = stats.buckets_written,
            deleted = stats.buckets_deleted,
            "Day bucket rebuild complete"
        );
        Ok(stats)
    }

    /// Running total supply after every mint/burn, grouped per day
    async fn total_supply_observations(
        &self,
        dao_id: &str,
        until: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DayObservations>, DayBucketError> {
        let rows = Transfers::find()
            .filter(transfers::Column::DaoId.eq(dao_id))
            .order_by(transfers::Column::Timestamp, Order::Asc)
            .order_by(transfers::Column::LogIndex, Order::Asc)
            .all(&self.db)
            .await
            .map_err(|e| DayBucketError::DatabaseError(format!("Query failed: {}", e)))?;

        let mut days: BTreeMap<NaiveDate, DayObservations> = BTreeMap::new();
        let mut supply = Decimal::ZERO;
        for row in rows {
            let minted = row.from_address == ZERO_ADDRESS;
            let burned = row.to_address == ZERO_ADDRESS;
            if !minted && !burned {
                continue;
            }
            let date = row.timestamp.date_naive();
            if date > until {
                break;
            }
            if minted {
                supply += row.amount;
            } else {
                supply -= row.amount;
            }
            let day = days.entry(date).or_default();
            day.values.push(supply);
            day.volume += row.amount;
        }
        Ok(days)
    }

    /// Total delegated voting power after every change, grouped per day
    async fn delegated_supply_observations(
        &self,
        dao_id: &str,
        until: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DayObservations>, DayBucketError> {
        let rows = VotingPowerHistory::find()
            .filter(voting_power_history::Column::DaoId.eq(dao_id))
            .order_by(voting_power_history::Column::Timestamp, Order::Asc)
            .order_by(voting_power_history::Column::LogIndex, Order::Asc)
            .all(&self.db)
            .await
            .map_err(|e| DayBucketError::DatabaseError(format!("Query failed: {}", e)))?;

        let mut days: BTreeMap<NaiveDate, DayObservations> = BTreeMap::new();
        let mut total = Decimal::ZERO;
        for row in rows {
            let date = row.timestamp.date_naive();
            if date > until {
                break;
            }
            total += row.delta;
            let day = days.entry(date).or_default();
            day.values.push(total);
            day.volume += row.delta.abs();
        }
        Ok(days)
    }

    /// Individual transfer amounts per day; volume is the daily sum
    async fn transfer_volume_observations(
        &self,
        dao_id: &str,
        until: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DayObservations>, DayBucketError> {
        let rows = Transfers::find()
            .filter(transfers::Column::DaoId.eq(dao_id))
            .order_by(transfers::Column::Timestamp, Order::Asc)
            .order_by(transfers::Column::LogIndex, Order::Asc)
            .all(&self.db)
            .await
            .map_err(|e| DayBucketError::DatabaseError(format!("Query failed: {}", e)))?;

        let mut days: BTreeMap<NaiveDate, DayObservations> = BTreeMap::new();
        for row in rows {
            let date = row.timestamp.date_naive();
            if date > until {
                break;
            }
            let day = days.entry(date).or_default();
            day.values.push(row.amount);
            day.volume += row.amount;
        }
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, n).unwrap()
    }

    #[test]
    fn test_forward_fill_carries_last_known_value() {
        let sparse = BTreeMap::from([(day(1), dec!(10)), (day(5), dec!(20))]);
        let filled = forward_fill(&sparse, None, day(7), None);

        let expected = BTreeMap::from([
            (day(1), dec!(10)),
            (day(2), dec!(10)),
            (day(3), dec!(10)),
            (day(4), dec!(10)),
            (day(5), dec!(20)),
            (day(6), dec!(20)),
            (day(7), dec!(20)),
        ]);
        assert_eq!(filled, expected);
    }

    #[test]
    fn test_forward_fill_seeds_from_initial_value() {
        let sparse = BTreeMap::from([(day(1), dec!(10)), (day(5), dec!(20))]);
        let filled = forward_fill(&sparse, Some(day(1) - Duration::days(1)), day(7), Some(dec!(5)));

        assert_eq!(filled.get(&(day(1) - Duration::days(1))), Some(&dec!(5)));
        assert_eq!(filled.get(&day(1)), Some(&dec!(10)));
        assert_eq!(filled.len(), 8);
    }

    #[test]
    fn test_forward_fill_omits_days_before_first_known_value() {
        let sparse = BTreeMap::from([(day(4), dec!(7))]);
        // explicit earlier start without an initial value: the unknown
        // prefix is omitted, not zero-filled
        let filled = forward_fill(&sparse, Some(day(1)), day(6), None);
        assert!(!filled.contains_key(&day(1)));
        assert!(!filled.contains_key(&day(3)));
        assert_eq!(filled.get(&day(4)), Some(&dec!(7)));
        assert_eq!(filled.len(), 3);
    }

    #[test]
    fn test_forward_fill_empty_input_is_empty() {
        let sparse = BTreeMap::new();
        assert!(forward_fill(&sparse, None, day(7), None).is_empty());
    }

    #[test]
    fn test_compose_treasury_anchored_on_price_series() {
        let prices = BTreeMap::from([(day(1), dec!(2)), (day(2), dec!(3))]);
        let qty = BTreeMap::from([(day(1), dec!(100)), (day(3), dec!(500))]);
        let other = BTreeMap::from([(day(2), dec!(7))]);

        let composed = compose_treasury(&prices, &qty, &other);

        // day 3 has a quantity but no price: not a real day
        assert_eq!(composed.len(), 2);
        assert_eq!(composed.get(&day(1)), Some(&dec!(200)));
        // missing quantity counts as zero, not forward-filled
        assert_eq!(composed.get(&day(2)), Some(&dec!(7)));
    }

    #[test]
    fn test_ohlc_summary() {
        let values = vec![dec!(10), dec!(4), dec!(25), dec!(15)];
        let summary = ohlc(&values).unwrap();
        assert_eq!(summary.open, dec!(10));
        assert_eq!(summary.close, dec!(15));
        assert_eq!(summary.low, dec!(4));
        assert_eq!(summary.high, dec!(25));
        assert_eq!(summary.average, dec!(13.5));
        assert!(ohlc(&[]).is_none());
    }
}
