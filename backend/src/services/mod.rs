//! Planning pipeline.
//!
//! Request normalization, prompt rendering, provider-output repair and the
//! retrying synthesizer that ties them together. Persistence is not done
//! here; see `db::services`.

pub mod error;
pub mod normalizer;
pub mod prompt;
pub mod repair;
pub mod synthesizer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{AttemptError, SchemaError, SynthesisError, ValidationError};
pub use normalizer::normalize;
pub use prompt::{build as build_prompt, Prompt};
pub use repair::validate;
pub use synthesizer::{RetryPolicy, Synthesizer};
