// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-user rate limiting for question answering

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter as GovRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use super::ApiError;

const DEFAULT_QUESTIONS_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(30) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

/// Limits how often each user may call the model
#[derive(Clone)]
pub struct AskRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    clock: DefaultClock,
    questions_per_minute: u32,
}

impl AskRateLimiter {
    /// Zero falls back to 30 questions per minute
    pub fn new(questions_per_minute: u32) -> Self {
        let rpm = NonZeroU32::new(questions_per_minute).unwrap_or(DEFAULT_QUESTIONS_PER_MINUTE);
        Self {
            limiter: Arc::new(GovRateLimiter::keyed(Quota::per_minute(rpm))),
            clock: DefaultClock::default(),
            questions_per_minute: rpm.get(),
        }
    }

    /// Count one question for `user_id`
    pub fn check(&self, user_id: &str) -> Result<(), ApiError> {
        self.limiter
            .check_key(&user_id.to_string())
            .map_err(|not_until| {
                let wait = not_until.wait_time_from(self.clock.now());
                ApiError::RateLimitExceeded {
                    retry_after: wait.as_secs().max(1),
                }
            })
    }

    /// Forget users whose quota has fully replenished
    pub fn shrink(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn questions_per_minute(&self) -> u32 {
        self.questions_per_minute
    }
}
