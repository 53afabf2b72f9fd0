#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

pub use rollout_test_utils::init_tracing;

/// Fail the test instead of hanging if a future never resolves.
pub async fn with_timeout<F, T>(fut: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), fut)
        .await
        .expect("test timed out")
}

/// Fixed clock for deploys: 2026-10-18 11:35:00 UTC plus `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 11, 35, 0).unwrap() + chrono::Duration::minutes(minutes)
}
