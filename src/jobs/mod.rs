pub mod day_bucket_sync;
