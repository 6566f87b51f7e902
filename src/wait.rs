// This file is part of the terraform-provider-huaweicloud project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wait for a remote object to reach a target status
//!
//! The refresh function is called until it reports one of the target
//! statuses, or an unexpected status, or until the timeout elapses.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace};

pub const DELETED: &str = "DELETED";

const DEFAULT_NOT_FOUND_CHECKS: usize = 20;
const MIN_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Result of a single refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refreshed<T> {
    /// The object exists and has the given status
    State(T, String),
    /// The object does not exist
    Gone,
}

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("timeout while waiting for state to become '{expected}' (last state: '{last_state}', timeout: {timeout:?})")]
    Timeout {
        last_state: String,
        expected: String,
        timeout: Duration,
    },
    #[error("unexpected state '{state}', wanted target '{expected}'")]
    UnexpectedState { state: String, expected: String },
    #[error("couldn't find resource ({checks} retries)")]
    NotFound { checks: usize },
    #[error(transparent)]
    Refresh(#[from] anyhow::Error),
}

/// Configuration of a wait loop
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    pub pending: &'static [&'static str],
    pub target: &'static [&'static str],
    /// Wait before the first refresh
    pub delay: Duration,
    /// Wait between two refreshes, exponential back-off when zero
    pub poll_interval: Duration,
    /// Smallest wait between two refreshes
    pub min_timeout: Duration,
    pub timeout: Duration,
    /// Number of consecutive "gone" answers tolerated when not waiting for deletion
    pub not_found_checks: usize,
    /// Number of consecutive target answers required
    pub continuous_target_occurrence: usize,
}

impl Default for StateChangeConf {
    fn default() -> Self {
        Self {
            pending: &[],
            target: &[],
            delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            min_timeout: Duration::ZERO,
            timeout: Duration::from_secs(600),
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            continuous_target_occurrence: 1,
        }
    }
}

impl StateChangeConf {
    fn expected(&self) -> String {
        self.target.join(", ")
    }

    fn waits_for_deletion(&self) -> bool {
        self.target.is_empty() || self.target.contains(&DELETED)
    }

    /// Poll `refresh` until a target status is reached
    ///
    /// Returns `None` when the object is gone and that was the target.
    pub async fn wait_for_state<T, F, Fut>(&self, mut refresh: F) -> Result<Option<T>, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<Refreshed<T>>>,
    {
        let mut last_state = String::new();
        let poll = async {
            tokio::time::sleep(self.delay).await;

            let mut backoff = MIN_BACKOFF;
            let mut not_found = 0;
            let mut occurrences = 0;
            loop {
                let refreshed = match refresh().await {
                    Ok(refreshed) => refreshed,
                    Err(err) => return Err(WaitError::Refresh(err)),
                };
                match refreshed {
                    Refreshed::Gone => {
                        last_state = DELETED.to_owned();
                        occurrences = 0;
                        if self.waits_for_deletion() {
                            return Ok(None);
                        }
                        not_found += 1;
                        if not_found > self.not_found_checks {
                            return Err(WaitError::NotFound {
                                checks: self.not_found_checks,
                            });
                        }
                    }
                    Refreshed::State(value, status) => {
                        trace!(status = %status, "Refreshed state");
                        not_found = 0;
                        last_state.clone_from(&status);
                        if self.target.contains(&status.as_str()) {
                            occurrences += 1;
                            if occurrences >= self.continuous_target_occurrence {
                                return Ok(Some(value));
                            }
                        } else if self.pending.contains(&status.as_str()) {
                            occurrences = 0;
                        } else {
                            return Err(WaitError::UnexpectedState {
                                state: status,
                                expected: self.expected(),
                            });
                        }
                    }
                }

                let wait = self.poll_interval.max(self.min_timeout);
                if wait.is_zero() {
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                } else {
                    tokio::time::sleep(wait).await;
                }
            }
        };

        let result = tokio::time::timeout(self.timeout, poll).await;
        match result {
            Ok(result) => result,
            Err(_) => {
                debug!(last_state = %last_state, timeout = ?self.timeout, "Wait timed out");
                Err(WaitError::Timeout {
                    last_state,
                    expected: self.expected(),
                    timeout: self.timeout,
                })
            }
        }
    }
}
