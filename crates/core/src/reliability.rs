// crates/core/src/reliability.rs

//! Retry with exponential backoff, result caching, and latency metrics for
//! calls to the remote desktop.
//!
//! Each call moves through `ATTEMPTING(1..=max_retries)` and ends either in
//! `SUCCEEDED` (latency recorded) or `FAILED` (the last error is returned).
//! Every failed attempt counts as one failure in the metrics.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::Result;
use moka::sync::Cache;

use crate::desktop_client::RemoteDesktop;

/// Result cache capacity, in distinct instructions.
pub const CACHE_CAPACITY: u64 = 100;

/// Something that can block the current thread for a while.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the calling thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// `max_retries` is the total number of attempts; zero is treated as one.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    /// Delay between attempt `attempt` and `attempt + 1`: `base * 2^(attempt-1)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Counters owned by one wrapper instance. Never persisted.
#[derive(Debug, Default)]
pub struct Metrics {
    operation_times: Vec<Duration>,
    success_count: u64,
    failure_count: u64,
}

impl Metrics {
    pub fn record_success(&mut self, elapsed: Duration) {
        self.operation_times.push(elapsed);
        self.success_count += 1;
    }

    pub fn record_failure(&mut self) {
        self.failure_count += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_operations = self.success_count + self.failure_count;
        let success_rate = if total_operations == 0 {
            0.0
        } else {
            self.success_count as f64 / total_operations as f64
        };

        let secs: Vec<f64> = self.operation_times.iter().map(|d| d.as_secs_f64()).collect();
        let (average_time, min_time, max_time) = if secs.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let sum: f64 = secs.iter().sum();
            let min = secs.iter().copied().fold(f64::INFINITY, f64::min);
            let max = secs.iter().copied().fold(0.0, f64::max);
            (sum / secs.len() as f64, min, max)
        };

        MetricsSnapshot {
            total_operations,
            success_count: self.success_count,
            failure_count: self.failure_count,
            success_rate,
            average_time,
            min_time,
            max_time,
        }
    }
}

/// Point-in-time view of [`Metrics`]. Times are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub total_operations: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub success_rate: f64,
    pub average_time: f64,
    pub min_time: f64,
    pub max_time: f64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  total_operations: {}", self.total_operations)?;
        writeln!(f, "  success_count: {}", self.success_count)?;
        writeln!(f, "  failure_count: {}", self.failure_count)?;
        writeln!(f, "  success_rate: {:.1}%", self.success_rate * 100.0)?;
        writeln!(f, "  average_time: {:.2}s", self.average_time)?;
        writeln!(f, "  min_time: {:.2}s", self.min_time)?;
        write!(f, "  max_time: {:.2}s", self.max_time)
    }
}

/// Retry engine plus the metrics it feeds.
pub struct Reliability {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    metrics: Mutex<Metrics>,
}

impl Reliability {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(ThreadSleeper))
    }

    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            policy,
            sleeper,
            metrics: Mutex::new(Metrics::default()),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` until it succeeds or the attempts run out.
    pub fn run<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max = self.policy.max_retries;
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            match op() {
                Ok(value) => {
                    let elapsed = started.elapsed();
                    self.lock_metrics().record_success(elapsed);
                    tracing::info!(
                        attempt,
                        elapsed_secs = elapsed.as_secs_f64(),
                        "operation succeeded"
                    );
                    return Ok(value);
                }
                Err(err) => {
                    self.lock_metrics().record_failure();
                    tracing::warn!(attempt, error = %err, "operation failed");

                    if attempt >= max {
                        tracing::error!(attempts = max, "operation failed after all attempts");
                        return Err(err);
                    }

                    let wait = self.policy.delay_after(attempt);
                    tracing::info!(wait_secs = wait.as_secs_f64(), "retrying");
                    self.sleeper.sleep(wait);
                    attempt += 1;
                }
            }
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.lock_metrics().snapshot()
    }

    fn lock_metrics(&self) -> MutexGuard<'_, Metrics> {
        self.metrics.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Outcome of one entry in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub operation: String,
    pub status: BatchStatus,
    /// The service's reply, or the error text when the entry failed.
    pub result: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Success,
    Failed,
}

/// A [`RemoteDesktop`] wrapped with retries, an optional result cache, and metrics.
pub struct ReliableDesktop<D: RemoteDesktop> {
    inner: D,
    reliability: Reliability,
    cache: Option<Cache<String, String>>,
}

impl<D: RemoteDesktop> ReliableDesktop<D> {
    pub fn new(inner: D, reliability: Reliability) -> Self {
        Self {
            inner,
            reliability,
            cache: None,
        }
    }

    /// Remember successful results for identical instructions for `ttl`.
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = if ttl.is_zero() {
            None
        } else {
            Some(
                Cache::builder()
                    .max_capacity(CACHE_CAPACITY)
                    .time_to_live(ttl)
                    .build(),
            )
        };
        self
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.reliability.metrics()
    }

    /// Send with retries but never answer from, or store into, the cache.
    pub fn prompt_uncached(&self, instruction: &str) -> Result<String> {
        self.reliability.run(|| self.inner.prompt(instruction))
    }

    /// Send each operation in order; failures are reported, not propagated.
    pub fn run_batch(&self, operations: &[String]) -> Vec<BatchOutcome> {
        operations
            .iter()
            .map(|operation| match self.prompt(operation) {
                Ok(result) => BatchOutcome {
                    operation: operation.clone(),
                    status: BatchStatus::Success,
                    result,
                },
                Err(e) => BatchOutcome {
                    operation: operation.clone(),
                    status: BatchStatus::Failed,
                    result: format!("{:#}", e),
                },
            })
            .collect()
    }
}

impl<D: RemoteDesktop> RemoteDesktop for ReliableDesktop<D> {
    fn prompt(&self, instruction: &str) -> Result<String> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(instruction) {
                tracing::info!("using cached result");
                return Ok(hit);
            }
        }

        let result = self.prompt_uncached(instruction)?;

        if let Some(cache) = &self.cache {
            cache.insert(instruction.to_string(), result.clone());
        }
        Ok(result)
    }

    fn query(&self, question: &str) -> Result<String> {
        self.prompt_uncached(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    /// Fails the first `fail_first` calls, then echoes the instruction.
    struct FlakyDesktop {
        fail_first: u32,
        calls: AtomicU32,
    }

    impl FlakyDesktop {
        fn new(fail_first: u32) -> Self {
            Self {
                fail_first,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RemoteDesktop for FlakyDesktop {
        fn prompt(&self, instruction: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                anyhow::bail!("attempt {} failed", n);
            }
            if instruction.starts_with("boom") {
                anyhow::bail!("refused");
            }
            Ok(format!("done: {}", instruction))
        }
    }

    fn reliability(max: u32) -> (Reliability, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let r = Reliability::with_sleeper(
            RetryPolicy::new(max, Duration::from_secs(1)),
            sleeper.clone(),
        );
        (r, sleeper)
    }

    #[test]
    fn always_failing_operation_uses_every_attempt_with_backoff() {
        let (r, sleeper) = reliability(4);
        let attempts = AtomicU32::new(0);

        let err = r
            .run(|| -> Result<()> {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                anyhow::bail!("failure #{}", n)
            })
            .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(err.to_string(), "failure #4");
        assert_eq!(
            *sleeper.slept.lock().unwrap(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );

        let m = r.metrics();
        assert_eq!(m.success_count, 0);
        assert_eq!(m.failure_count, 4);
    }

    #[test]
    fn success_on_third_attempt_records_two_failures() {
        let (r, sleeper) = reliability(3);
        let desktop = FlakyDesktop::new(2);

        let out = r.run(|| desktop.prompt("hello")).unwrap();

        assert_eq!(out, "done: hello");
        assert_eq!(desktop.calls(), 3);
        assert_eq!(sleeper.slept.lock().unwrap().len(), 2);

        let m = r.metrics();
        assert_eq!(m.success_count, 1);
        assert_eq!(m.failure_count, 2);
        assert_eq!(m.total_operations, 3);
        assert!((m.success_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_metrics_are_all_zero() {
        let (r, _) = reliability(3);
        let m = r.metrics();
        assert_eq!(m.total_operations, 0);
        assert_eq!(m.success_rate, 0.0);
        assert_eq!(m.average_time, 0.0);
        assert_eq!(m.min_time, 0.0);
        assert_eq!(m.max_time, 0.0);
    }

    #[test]
    fn latency_stats_follow_recorded_times() {
        let mut metrics = Metrics::default();
        metrics.record_success(Duration::from_millis(500));
        metrics.record_success(Duration::from_millis(1500));
        metrics.record_failure();

        let m = metrics.snapshot();
        assert_eq!(m.total_operations, 3);
        assert!((m.average_time - 1.0).abs() < 1e-9);
        assert!((m.min_time - 0.5).abs() < 1e-9);
        assert!((m.max_time - 1.5).abs() < 1e-9);
    }

    #[test]
    fn zero_retries_still_attempts_once() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.delay_after(3), Duration::from_millis(40));
    }

    #[test]
    fn cache_answers_repeated_instructions() {
        let (r, _) = reliability(3);
        let desktop = ReliableDesktop::new(FlakyDesktop::new(0), r)
            .with_cache(Duration::from_secs(60));

        assert_eq!(desktop.prompt("same").unwrap(), "done: same");
        assert_eq!(desktop.prompt("same").unwrap(), "done: same");
        assert_eq!(desktop.prompt("other").unwrap(), "done: other");

        assert_eq!(desktop.inner().calls(), 2);
        assert_eq!(desktop.metrics().success_count, 2);
    }

    #[test]
    fn uncached_calls_skip_the_cache() {
        let (r, _) = reliability(1);
        let desktop = ReliableDesktop::new(FlakyDesktop::new(0), r)
            .with_cache(Duration::from_secs(60));

        desktop.prompt("check").unwrap();
        desktop.prompt_uncached("check").unwrap();
        desktop.query("check").unwrap();
        assert_eq!(desktop.inner().calls(), 3);
    }

    #[test]
    fn failures_are_not_cached() {
        let (r, _) = reliability(1);
        let desktop = ReliableDesktop::new(FlakyDesktop::new(1), r)
            .with_cache(Duration::from_secs(60));

        assert!(desktop.prompt("x").is_err());
        assert_eq!(desktop.prompt("x").unwrap(), "done: x");
        assert_eq!(desktop.inner().calls(), 2);
    }

    #[test]
    fn without_cache_every_call_goes_out() {
        let (r, _) = reliability(1);
        let desktop = ReliableDesktop::new(FlakyDesktop::new(0), r);

        desktop.prompt("same").unwrap();
        desktop.prompt("same").unwrap();
        assert_eq!(desktop.inner().calls(), 2);
    }

    #[test]
    fn batch_continues_past_failures() {
        let (r, _) = reliability(2);
        let desktop = ReliableDesktop::new(FlakyDesktop::new(0), r);
        let ops = vec![
            "Find my next event".to_string(),
            "boom".to_string(),
            "Schedule lunch on Friday at 12pm".to_string(),
        ];

        let outcomes = desktop.run_batch(&ops);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status, BatchStatus::Success);
        assert_eq!(outcomes[1].status, BatchStatus::Failed);
        assert_eq!(outcomes[1].result, "refused");
        assert_eq!(outcomes[2].status, BatchStatus::Success);
        assert_eq!(desktop.metrics().failure_count, 2);
    }
}
