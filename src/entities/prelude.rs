pub use super::balance_history::Entity as BalanceHistory;
pub use super::dao_metrics_day_bucket::Entity as DaoMetricsDayBucket;
pub use super::delegations::Entity as Delegations;
pub use super::proposals::Entity as Proposals;
pub use super::transfers::Entity as Transfers;
pub use super::votes_onchain::Entity as VotesOnchain;
pub use super::voting_power_history::Entity as VotingPowerHistory;
