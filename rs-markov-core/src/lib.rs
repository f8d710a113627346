//! Bigram Markov chain over token sequences.
//!
//! This crate provides:
//! - A weighted frequency table with exact index/item inversion
//! - A Markov chain trained on token sequences (start, bigram and end statistics)
//! - Lazy, reproducible walks driven by a pluggable number generator
//! - Recovery of the choices that reproduce a given walk
//! - Persistence and parallel training of chains
//!
//! Tokenization is not handled here: training input is already a sequence
//! of tokens.

/// Distributions, chains, number generators and walks.
pub mod model;

/// Error type shared by every operation of the crate.
pub mod error;

/// Corpus files and path helpers.
pub mod io;

pub use error::{ChainError, ErrorKind};
pub use model::distribution::ProbabilityDistribution;
pub use model::markov_chain::{MarkovChain, END_TOKEN};
pub use model::number_generator::{NumberGenerator, RandomNumberGenerator, ReplayNumberGenerator};
pub use model::walk::WalkIterator;
