use std::collections::VecDeque;

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

use crate::error::ChainError;

/// Source of sampling indices for a walk.
///
/// Each call hands out the next integer in `[0, bound)`. Implementations are
/// stateful and must not be shared between walks.
///
/// # Errors
/// - `InvalidBound` if `bound` is zero
/// - implementation-specific errors when no valid value can be produced
pub trait NumberGenerator {
	fn next_index(&mut self, bound: usize) -> Result<usize, ChainError>;
}

impl<G: NumberGenerator + ?Sized> NumberGenerator for &mut G {
	fn next_index(&mut self, bound: usize) -> Result<usize, ChainError> {
		(**self).next_index(bound)
	}
}

impl<G: NumberGenerator + ?Sized> NumberGenerator for Box<G> {
	fn next_index(&mut self, bound: usize) -> Result<usize, ChainError> {
		(**self).next_index(bound)
	}
}

/// Deterministic generator replaying a fixed list of values, front to back.
///
/// Used to make walks reproducible. A value is consumed even when it does not
/// fit the requested bound.
#[derive(Clone, Debug, Default)]
pub struct ReplayNumberGenerator {
	values: VecDeque<usize>,
}

impl ReplayNumberGenerator {
	pub fn new<I: IntoIterator<Item = usize>>(values: I) -> Self {
		Self { values: values.into_iter().collect() }
	}

	/// Number of values not yet handed out.
	pub fn remaining(&self) -> usize {
		self.values.len()
	}
}

impl NumberGenerator for ReplayNumberGenerator {
	fn next_index(&mut self, bound: usize) -> Result<usize, ChainError> {
		if bound == 0 {
			return Err(ChainError::InvalidBound { bound });
		}
		let value = self.values.pop_front().ok_or(ChainError::GeneratorExhausted)?;
		if value >= bound {
			return Err(ChainError::ValueOutOfBound { value, bound });
		}
		Ok(value)
	}
}

/// Uniform random generator backed by any `rand` RNG.
///
/// Defaults to the thread-local RNG; `seeded` builds a reproducible one.
#[derive(Debug)]
pub struct RandomNumberGenerator<R: Rng = ThreadRng> {
	rng: R,
}

impl RandomNumberGenerator<ThreadRng> {
	pub fn new() -> Self {
		Self { rng: rand::rng() }
	}
}

impl Default for RandomNumberGenerator<ThreadRng> {
	fn default() -> Self {
		Self::new()
	}
}

impl RandomNumberGenerator<StdRng> {
	pub fn seeded(seed: u64) -> Self {
		Self { rng: StdRng::seed_from_u64(seed) }
	}
}

impl<R: Rng> RandomNumberGenerator<R> {
	pub fn from_rng(rng: R) -> Self {
		Self { rng }
	}
}

impl<R: Rng> NumberGenerator for RandomNumberGenerator<R> {
	fn next_index(&mut self, bound: usize) -> Result<usize, ChainError> {
		if bound == 0 {
			return Err(ChainError::InvalidBound { bound });
		}
		Ok(self.rng.random_range(0..bound))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;

	#[test]
	fn test_replay_in_order() {
		let mut g = ReplayNumberGenerator::new(vec![0, 2, 1]);
		assert_eq!(g.next_index(3).unwrap(), 0);
		assert_eq!(g.next_index(3).unwrap(), 2);
		assert_eq!(g.remaining(), 1);
		assert_eq!(g.next_index(2).unwrap(), 1);
	}

	#[test]
	fn test_replay_exhausted() {
		let mut g = ReplayNumberGenerator::new(vec![0]);
		g.next_index(1).unwrap();
		let err = g.next_index(1).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::NoSuchElement);
	}

	#[test]
	fn test_replay_value_too_large() {
		let mut g = ReplayNumberGenerator::new(vec![5, 0]);
		let err = g.next_index(5).unwrap_err();
		assert!(matches!(err, ChainError::ValueOutOfBound { value: 5, bound: 5 }));
		// The rejected value is gone
		assert_eq!(g.next_index(5).unwrap(), 0);
	}

	#[test]
	fn test_zero_bound() {
		let mut g = ReplayNumberGenerator::new(vec![0]);
		assert_eq!(g.next_index(0).unwrap_err().kind(), ErrorKind::InvalidArgument);
		assert_eq!(g.remaining(), 1);

		let mut r = RandomNumberGenerator::new();
		assert_eq!(r.next_index(0).unwrap_err().kind(), ErrorKind::InvalidArgument);
	}

	#[test]
	fn test_random_within_bound() {
		let mut r = RandomNumberGenerator::seeded(42);
		for bound in 1..50 {
			assert!(r.next_index(bound).unwrap() < bound);
		}
	}

	#[test]
	fn test_seeded_is_reproducible() {
		let mut a = RandomNumberGenerator::seeded(7);
		let mut b = RandomNumberGenerator::seeded(7);
		let xs: Vec<usize> = (0..20).map(|_| a.next_index(1000).unwrap()).collect();
		let ys: Vec<usize> = (0..20).map(|_| b.next_index(1000).unwrap()).collect();
		assert_eq!(xs, ys);
	}

	#[test]
	fn test_from_rng_matches_seeded() {
		let mut own = RandomNumberGenerator::from_rng(StdRng::seed_from_u64(9));
		let mut seeded = RandomNumberGenerator::seeded(9);
		for bound in 1..30 {
			assert_eq!(own.next_index(bound).unwrap(), seeded.next_index(bound).unwrap());
		}
	}

	fn draw<G: NumberGenerator>(mut g: G, bound: usize) -> Result<usize, ChainError> {
		g.next_index(bound)
	}

	#[test]
	fn test_through_mut_ref_and_box() {
		let mut g = ReplayNumberGenerator::new(vec![1, 0]);
		assert_eq!(draw(&mut g, 2).unwrap(), 1);
		assert_eq!(g.remaining(), 1);

		let boxed: Box<dyn NumberGenerator> = Box::new(g);
		assert_eq!(draw(boxed, 2).unwrap(), 0);
	}
}
