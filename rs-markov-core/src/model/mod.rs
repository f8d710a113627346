//! Top-level module for the Markov chain model.
//!
//! - Frequency tables (`ProbabilityDistribution`)
//! - The trained chain (`MarkovChain`)
//! - Sources of sampling indices (`NumberGenerator`)
//! - Walks through a chain (`WalkIterator`)

/// Ordered frequency table with weighted picking and its inverse.
pub mod distribution;

/// Bigram chain: training, queries, walks, persistence and merging.
pub mod markov_chain;

/// `NumberGenerator` capability with replay and random implementations.
pub mod number_generator;

/// Pull-based walk through a trained chain.
pub mod walk;
