use std::{
    collections::{HashMap, VecDeque},
    net::IpAddr,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;
use tracing::debug;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rule {
    limit: u32,
    window: Duration,
}

#[derive(Debug, Default)]
struct Windows {
    hits: HashMap<Option<IpAddr>, VecDeque<Instant>>,
    last_sweep: Option<Instant>,
}

/// Sliding windows per peer address. A limit of 0 disables that rule.
///
/// Peers whose hits have all aged out are forgotten, at the latest one
/// horizon (the longest window) after their last request.
pub struct RateLimiter {
    rules: Vec<Rule>,
    horizon: Duration,
    state: Mutex<Windows>,
}

fn prune(window: &mut VecDeque<Instant>, now: Instant, horizon: Duration) {
    while window
        .front()
        .is_some_and(|hit| now.duration_since(*hit) >= horizon)
    {
        window.pop_front();
    }
}

impl RateLimiter {
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, 0)
    }

    pub fn new(per_minute: u32, per_hour: u32) -> Self {
        let rules: Vec<Rule> = [(per_minute, MINUTE), (per_hour, HOUR)]
            .into_iter()
            .filter(|(limit, _)| *limit > 0)
            .map(|(limit, window)| Rule { limit, window })
            .collect();
        let horizon = rules
            .iter()
            .map(|rule| rule.window)
            .max()
            .unwrap_or(Duration::ZERO);
        Self {
            rules,
            horizon,
            state: Mutex::new(Windows::default()),
        }
    }

    pub async fn try_acquire(&self, peer: Option<IpAddr>) -> bool {
        self.try_acquire_at(peer, Instant::now()).await
    }

    pub(crate) async fn try_acquire_at(&self, peer: Option<IpAddr>, now: Instant) -> bool {
        if self.rules.is_empty() {
            return true;
        }

        let mut state = self.state.lock().await;
        match state.last_sweep {
            Some(last) if now.duration_since(last) < self.horizon => {}
            Some(_) => {
                let before = state.hits.len();
                state.hits.retain(|_, window| {
                    prune(window, now, self.horizon);
                    !window.is_empty()
                });
                debug!(
                    forgotten = before - state.hits.len(),
                    tracked = state.hits.len(),
                    "rate limit: swept idle peers"
                );
                state.last_sweep = Some(now);
            }
            None => state.last_sweep = Some(now),
        }

        let window = state.hits.entry(peer).or_default();
        prune(window, now, self.horizon);
        let allowed = self.rules.iter().all(|rule| {
            let recent = window
                .iter()
                .rev()
                .take_while(|hit| now.duration_since(**hit) < rule.window)
                .count();
            recent < rule.limit as usize
        });
        if allowed {
            window.push_back(now);
        }
        allowed
    }

    #[cfg(test)]
    pub(crate) async fn tracked_peers(&self) -> usize {
        self.state.lock().await.hits.len()
    }
}
