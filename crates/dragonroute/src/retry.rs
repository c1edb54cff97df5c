use std::time::Duration;
use tracing::debug;

/// Endpoint rotation policy for RPC reads.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Number of full passes over the endpoint list.
    pub rounds: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Random jitter (`0..=jitter_max_ms`) added to each sleep.
    pub jitter_max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            // Pool lookups fan out per fee tier; keep the worst case short.
            rounds: 2,
            base_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(2),
            jitter_max_ms: 150,
        }
    }
}

impl BackoffConfig {
    fn delay_after_round(&self, round: usize) -> Duration {
        let shift = u32::try_from(round.min(16)).unwrap_or(16_u32);
        let factor = 1_u64.checked_shl(shift).unwrap_or(u64::MAX);
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let ms = base_ms.saturating_mul(factor).min(max_ms);
        let jitter = if cfg!(test) || self.jitter_max_ms == 0 {
            0
        } else {
            rand::random::<u64>() % self.jitter_max_ms.saturating_add(1).max(1)
        };
        Duration::from_millis(ms.saturating_add(jitter))
    }
}

/// Run `op` against each endpoint in order until one succeeds. A round ends when every
/// endpoint has failed once; rounds are separated by exponential backoff.
pub async fn try_all_with_backoff<I, T, Fut>(
    endpoints: &[I],
    cfg: &BackoffConfig,
    mut op: impl FnMut(&I) -> Fut + Send,
    label: &'static str,
) -> eyre::Result<T>
where
    I: Sync,
    Fut: std::future::Future<Output = eyre::Result<T>> + Send,
{
    if endpoints.is_empty() {
        eyre::bail!("{label}: no rpc endpoints configured");
    }
    if cfg.rounds == 0 {
        eyre::bail!("{label}: invalid backoff config: rounds=0");
    }

    let mut last_err: Option<eyre::Report> = None;
    for round in 0..cfg.rounds {
        for (idx, endpoint) in endpoints.iter().enumerate() {
            match op(endpoint).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    debug!(label, round, endpoint = idx, error = %e, "rpc attempt failed");
                    last_err = Some(e);
                }
            }
        }
        if round + 1 < cfg.rounds {
            tokio::time::sleep(cfg.delay_after_round(round)).await;
        }
    }

    Err(last_err
        .unwrap_or_else(|| eyre::eyre!("no attempt made"))
        .wrap_err(label))
}
