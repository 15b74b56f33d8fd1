//! # Throttle Types
//!
//! Rate/burst limits and the per-method override entry used when a usage
//! plan is bound to a stage. Limits are enforced per tier, not per method;
//! override entries exist because the stage binding requires every covered
//! method to be listed explicitly, and they always carry the tier-level
//! values.

use serde::{Deserialize, Serialize};

use crate::gateway::HttpVerb;

/// A rate/burst throttle pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throttle {
    /// Steady-state requests per second.
    pub rate_limit: u32,
    /// Burst capacity above the steady rate.
    pub burst_limit: u32,
}

impl Throttle {
    pub fn new(rate_limit: u32, burst_limit: u32) -> Self {
        Self {
            rate_limit,
            burst_limit,
        }
    }
}

impl std::fmt::Display for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} rps / burst {}", self.rate_limit, self.burst_limit)
    }
}

/// One per-method throttle override in a plan-to-stage binding.
///
/// Keys a method by its full resource path and verb. The throttle value
/// mirrors the plan default; no per-method differentiation is modeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodThrottle {
    /// Full resource path of the method (`/someService/someResources`).
    pub path: String,
    /// HTTP verb of the method.
    pub verb: HttpVerb,
    /// Override value; always the tier's plan-level throttle.
    pub throttle: Throttle,
}

impl MethodThrottle {
    /// The binding key for this override: `{path}/{VERB}`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.path, self.verb)
    }
}
