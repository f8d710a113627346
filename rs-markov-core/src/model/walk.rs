use std::collections::BTreeMap;

use log::{trace, warn};

use super::distribution::ProbabilityDistribution;
use super::markov_chain::END_TOKEN;
use super::number_generator::NumberGenerator;
use crate::error::ChainError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum WalkState {
	/// A token has been drawn and not yet handed out.
	Pending(String),
	Terminated,
}

/// One walk through a trained `MarkovChain`.
///
/// The path is decided by the owned `NumberGenerator`: the first value picks
/// a start token, each following value picks the successor of the previous
/// token, until `END_TOKEN` is drawn.
///
/// The walk is single-pass. It borrows the chain's successor table, so the
/// chain cannot be trained while a walk is alive.
///
/// # Example
/// With the illustrative chain, replaying `[0, 2, 0]` yields `"a"` (index 0
/// of `{ "a":2 }`), then `"chair"` (index 2 of
/// `{ "banana":2  "chair":1  "table":1 }`), then draws `END_TOKEN` from
/// `{ "<END>":1 }` and stops.
#[derive(Debug)]
pub struct WalkIterator<'a, G: NumberGenerator> {
	bigrams: &'a BTreeMap<String, ProbabilityDistribution<String>>,
	generator: G,
	state: WalkState,
}

impl<'a, G: NumberGenerator> WalkIterator<'a, G> {
	/// Draws the first token from `start_tokens`.
	///
	/// Never fails: an empty start distribution or a generator that cannot
	/// supply a valid first index produces an empty walk.
	pub(crate) fn new(
		start_tokens: &ProbabilityDistribution<String>,
		bigrams: &'a BTreeMap<String, ProbabilityDistribution<String>>,
		mut generator: G,
	) -> Self {
		let state = if start_tokens.is_empty() {
			WalkState::Terminated
		} else {
			match start_tokens.pick_with(&mut generator) {
				Ok(token) => {
					trace!("walk starts with '{}'", token);
					WalkState::Pending(token.clone())
				}
				Err(e) => {
					warn!("walk could not draw a start token: {}", e);
					WalkState::Terminated
				}
			}
		};

		Self { bigrams, generator, state }
	}

	/// True if `next_token` will return a real token.
	pub fn has_next(&self) -> bool {
		matches!(&self.state, WalkState::Pending(token) if token != END_TOKEN)
	}

	/// Returns the pending token and draws its successor.
	///
	/// The successor may be `END_TOKEN`; the walk then reports `has_next() ==
	/// false` on the following check.
	///
	/// # Errors
	/// - `WalkFinished` if `has_next()` is false
	/// - `UnknownToken` if the pending token has no successor distribution
	/// - any generator error raised while drawing the successor
	///
	/// After an error the walk is terminated.
	pub fn next_token(&mut self) -> Result<String, ChainError> {
		if !self.has_next() {
			return Err(ChainError::WalkFinished);
		}
		let current = match std::mem::replace(&mut self.state, WalkState::Terminated) {
			WalkState::Pending(token) => token,
			WalkState::Terminated => return Err(ChainError::WalkFinished),
		};

		let successors = self
			.bigrams
			.get(&current)
			.ok_or_else(|| ChainError::UnknownToken { token: current.clone() })?;
		let next = successors.pick_with(&mut self.generator)?;
		trace!("walk '{}' -> '{}'", current, next);
		self.state = WalkState::Pending(next.clone());

		Ok(current)
	}

	/// Drains the walk into a vector of tokens.
	///
	/// # Errors
	/// The first error raised by `next_token`.
	pub fn collect_tokens(self) -> Result<Vec<String>, ChainError> {
		self.collect()
	}

	/// Gives the generator back, e.g. to inspect what a replay left unused.
	pub fn into_generator(self) -> G {
		self.generator
	}
}

impl<G: NumberGenerator> Iterator for WalkIterator<'_, G> {
	type Item = Result<String, ChainError>;

	fn next(&mut self) -> Option<Self::Item> {
		if !self.has_next() {
			return None;
		}
		Some(self.next_token())
	}
}

impl<G: NumberGenerator> std::iter::FusedIterator for WalkIterator<'_, G> {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;
	use crate::model::markov_chain::MarkovChain;
	use crate::model::number_generator::ReplayNumberGenerator;

	fn chain() -> MarkovChain {
		let mut chain = MarkovChain::new();
		chain.add_sequence(["a", "b", "c"]);
		chain.add_sequence(["a", "c"]);
		chain
	}

	#[test]
	fn test_walk_steps() {
		let chain = chain();
		// a -> { b:1 c:1 }, b -> { c:1 }, c -> { <END>:2 }
		let mut walk = chain.get_walk(ReplayNumberGenerator::new(vec![1, 0, 0, 1]));
		assert!(walk.has_next());
		assert_eq!(walk.next_token().unwrap(), "a");
		assert_eq!(walk.next_token().unwrap(), "b");
		assert_eq!(walk.next_token().unwrap(), "c");
		assert!(!walk.has_next());
		assert!(matches!(walk.next_token(), Err(ChainError::WalkFinished)));
		assert_eq!(walk.into_generator().remaining(), 0);
	}

	#[test]
	fn test_empty_chain_gives_empty_walk() {
		let chain = MarkovChain::new();
		let mut walk = chain.get_walk(ReplayNumberGenerator::new(vec![0]));
		assert!(!walk.has_next());
		assert_eq!(walk.next_token().unwrap_err().kind(), ErrorKind::NoSuchElement);
		// The start draw never happened
		assert_eq!(walk.into_generator().remaining(), 1);
	}

	#[test]
	fn test_bad_first_draw_gives_empty_walk() {
		let chain = chain();
		assert!(!chain.get_walk(ReplayNumberGenerator::new(vec![])).has_next());
		assert!(!chain.get_walk(ReplayNumberGenerator::new(vec![2])).has_next());
	}

	#[test]
	fn test_generator_error_propagates() {
		let chain = chain();
		let mut walk = chain.get_walk(ReplayNumberGenerator::new(vec![0, 7]));
		let err = walk.next_token().unwrap_err();
		assert!(matches!(err, ChainError::ValueOutOfBound { value: 7, bound: 2 }));
		assert!(!walk.has_next());
	}

	#[test]
	fn test_exhausted_generator_propagates() {
		let chain = chain();
		let mut walk = chain.get_walk(ReplayNumberGenerator::new(vec![0]));
		assert!(walk.has_next());
		assert!(matches!(walk.next_token(), Err(ChainError::GeneratorExhausted)));
	}

	#[test]
	fn test_iterator_is_fused() {
		let chain = chain();
		let mut walk = chain.get_walk(ReplayNumberGenerator::new(vec![0, 5]));
		assert!(matches!(walk.next(), Some(Err(_))));
		assert!(walk.next().is_none());
		assert!(walk.next().is_none());
	}

	#[test]
	fn test_collect_tokens() {
		let chain = chain();
		let tokens = chain.get_walk(ReplayNumberGenerator::new(vec![0, 1, 0])).collect_tokens().unwrap();
		assert_eq!(tokens, vec!["a", "c"]);
	}
}
