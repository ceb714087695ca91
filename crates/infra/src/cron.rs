//! One-shot job wrapper for externally scheduled binaries.

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use tracing::{error, info};

/// Runs a job once and logs its name, arguments, duration and outcome.
#[derive(Debug, Clone)]
pub struct CronRunner {
    name: String,
    args: Vec<String>,
}

impl CronRunner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Process arguments to include in the log line.
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn run<F, T, E>(&self, job: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let started = Instant::now();
        let result = job.await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(
                name = %self.name,
                args = ?self.args,
                duration_ms,
                "finished executing cron job"
            ),
            Err(e) => error!(
                name = %self.name,
                args = ?self.args,
                duration_ms,
                error = %e,
                "failed executing cron job"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_the_job_result_through() {
        let runner = CronRunner::new("expired-order").with_args(["--once".to_string()]);
        assert_eq!(runner.name(), "expired-order");

        let ok: Result<u32, String> = runner.run(async { Ok(3) }).await;
        assert_eq!(ok, Ok(3));

        let err: Result<u32, String> = runner.run(async { Err("scan failed".to_string()) }).await;
        assert_eq!(err, Err("scan failed".to_string()));
    }
}
