//! Bounded timeout and retry policy for provider calls.
//!
//! Every language-model and embedding call made by the pipeline goes through
//! [`with_retry`], usually via the [`ResilientLlm`] and [`ResilientEmbedder`]
//! decorators. Each attempt is bounded by a timeout; rate limits and network
//! failures are retried with exponential backoff and jitter, while
//! authentication failures and malformed responses fail immediately.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod policy;
mod providers;

pub use policy::{RetryPolicy, RetryPolicyBuilder, with_retry};
pub use providers::{ResilientEmbedder, ResilientLlm};
