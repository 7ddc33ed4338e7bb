pub mod aggregate;
pub mod balance;
pub mod dao;
pub mod day_bucket;
pub mod delegation;
pub mod event;
pub mod proposal;
pub mod voting_power;
