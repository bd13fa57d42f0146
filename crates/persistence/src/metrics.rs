//! Database metrics collection.
//!
//! Every repository query runs under a [`QueryTimer`]; the health endpoint
//! samples the pool gauges.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &'static str, duration_secs: f64) {
    histogram!("database_query_duration_seconds", "query" => query_name).record(duration_secs);
}

/// Record connection pool gauges.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one repository operation.
///
/// ```ignore
/// let timer = QueryTimer::new("find_circle_by_slug");
/// let result = sqlx::query_as::<_, CircleEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
///
/// Transactional operations record once, after commit, so rolled back
/// attempts are not counted.
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_name() {
        let timer = QueryTimer::new("redeem_invitation");
        assert_eq!(timer.query_name, "redeem_invitation");
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        // No global recorder installed: recording must not panic.
        QueryTimer::new("count_public_circles").record();
        record_query_duration("count_public_circles", 0.01);
    }
}
