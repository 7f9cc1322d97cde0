//! Per-host connection cap.
//!
//! # Responsibilities
//! - Track in-flight exchanges per destination (scheme + authority)
//! - Make callers wait for a slot once a host reaches its cap
//! - Release the slot when the guard drops
//! - Forget a host once nothing holds or waits for one of its slots, so the
//!   map only tracks hosts with traffic in flight

use std::sync::Arc;

use dashmap::DashMap;
use http::Uri;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Hands out per-host slots. A `max` of zero disables the cap.
#[derive(Debug)]
pub struct HostLimiter {
    max: usize,
    hosts: DashMap<String, Arc<Semaphore>>,
}

/// A held slot; dropping it frees the slot for the next caller.
#[derive(Debug)]
pub struct HostSlot {
    permit: Option<OwnedSemaphorePermit>,
    owner: Option<(Arc<HostLimiter>, String)>,
}

impl Drop for HostSlot {
    fn drop(&mut self) {
        // The permit holds a reference to the semaphore; release it first.
        drop(self.permit.take());
        if let Some((limiter, key)) = self.owner.take() {
            limiter.forget_if_idle(&key);
        }
    }
}

impl HostLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            max,
            hosts: DashMap::new(),
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Wait for a slot on the host addressed by `uri`.
    pub async fn acquire(self: &Arc<Self>, uri: &Uri) -> HostSlot {
        if self.max == 0 {
            return HostSlot {
                permit: None,
                owner: None,
            };
        }

        let key = host_key(uri);
        let semaphore = self
            .hosts
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Semaphore::new(self.max)))
            .clone();

        // The semaphore is never closed, so acquiring only fails on a bug.
        let permit = semaphore.acquire_owned().await.ok();
        HostSlot {
            permit,
            owner: Some((self.clone(), key)),
        }
    }

    /// Number of hosts currently tracked.
    pub fn tracked_hosts(&self) -> usize {
        self.hosts.len()
    }

    // Runs under the shard lock, so no acquirer can clone the semaphore
    // between the check and the removal.
    fn forget_if_idle(&self, key: &str) {
        self.hosts.remove_if(key, |_, semaphore| {
            Arc::strong_count(semaphore) == 1 && semaphore.available_permits() == self.max
        });
    }

    /// Slots currently held for the host addressed by `uri`.
    pub fn in_use(&self, uri: &Uri) -> usize {
        self.hosts
            .get(&host_key(uri))
            .map(|s| self.max - s.available_permits())
            .unwrap_or(0)
    }
}

fn host_key(uri: &Uri) -> String {
    let scheme = uri.scheme_str().unwrap_or("http");
    let authority = uri.authority().map(|a| a.as_str()).unwrap_or("");
    format!("{}://{}", scheme, authority)
}
