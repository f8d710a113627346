use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::number_generator::NumberGenerator;
use crate::error::ChainError;

/// Frequency table supporting weighted sampling by index.
///
/// Items are kept in their natural ascending order. Sampling walks the items
/// in that order, so each item owns the contiguous range
/// `[cumulative_before, cumulative_before + count)` of `[0, total)`.
///
/// ## Responsibilities:
/// - Count occurrences during training
/// - Map an index in `[0, total)` to an item (`pick`)
/// - Map an item back to the first index of its range (`index`)
/// - Merge with another table (parallel training support)
///
/// ## Invariants
/// - Every recorded item has a count >= 1
/// - `total` is the sum of all counts
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProbabilityDistribution<T: Ord> {
	/// Occurrence count per item.
	/// Example: { "banana" => 2, "chair" => 1, "table" => 1 }
	records: BTreeMap<T, usize>,
	total: usize,
}

impl<T: Ord> Default for ProbabilityDistribution<T> {
	fn default() -> Self {
		Self { records: BTreeMap::new(), total: 0 }
	}
}

impl<T: Ord> ProbabilityDistribution<T> {
	/// Creates an empty distribution.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of `item`.
	///
	/// - If the item already exists, its count is increased.
	/// - Otherwise it is inserted with a count of 1.
	pub fn record(&mut self, item: T) {
		*self.records.entry(item).or_insert(0) += 1;
		self.total += 1;
	}

	/// Sum of all counts.
	pub fn total(&self) -> usize {
		self.total
	}

	/// Number of distinct items.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Count recorded for `item`, 0 if absent.
	pub fn count(&self, item: &T) -> usize {
		self.records.get(item).copied().unwrap_or(0)
	}

	/// Read-only view of the ordered (item, count) pairs.
	pub fn records(&self) -> &BTreeMap<T, usize> {
		&self.records
	}

	/// Returns the item whose cumulative range contains `index`.
	///
	/// This method performs:
	/// - an O(n) scan over the items in ascending order
	/// - a cumulative subtraction to select a bucket
	///
	/// # Errors
	/// - `EmptyDistribution` if nothing was recorded
	/// - `IndexOutOfRange` if `index >= total`
	pub fn pick(&self, index: usize) -> Result<&T, ChainError> {
		if self.records.is_empty() {
			return Err(ChainError::EmptyDistribution);
		}
		if index >= self.total {
			return Err(ChainError::IndexOutOfRange { index, total: self.total });
		}

		let mut remaining = index;
		for (item, count) in &self.records {
			if remaining < *count {
				return Ok(item);
			}
			remaining -= count;
		}

		// Unreachable while `total` matches the records
		Err(ChainError::IndexOutOfRange { index, total: self.total })
	}

	/// Draws one value bounded by `total` from `generator` and picks with it.
	///
	/// # Errors
	/// Any generator failure (zero bound, exhaustion, out-of-bound value),
	/// or the errors of `pick`.
	pub fn pick_with<G: NumberGenerator + ?Sized>(&self, generator: &mut G) -> Result<&T, ChainError> {
		if self.records.is_empty() {
			return Err(ChainError::EmptyDistribution);
		}
		let index = generator.next_index(self.total)?;
		self.pick(index)
	}

	/// Smallest index `i` such that `pick(i)` returns `item`.
	///
	/// # Errors
	/// Returns `ItemNotFound` if `item` was never recorded.
	pub fn index(&self, item: &T) -> Result<usize, ChainError> {
		if !self.records.contains_key(item) {
			return Err(ChainError::ItemNotFound);
		}
		Ok(self.records.range(..item).map(|(_, count)| count).sum())
	}

	/// Merges another distribution into this one, summing counts.
	pub fn merge(&mut self, other: &Self)
	where
		T: Clone,
	{
		for (item, count) in &other.records {
			*self.records.entry(item.clone()).or_insert(0) += *count;
		}
		self.total += other.total;
	}
}

impl<T: Ord> FromIterator<T> for ProbabilityDistribution<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		let mut distribution = Self::new();
		for item in iter {
			distribution.record(item);
		}
		distribution
	}
}

/// Renders as `{ "banana":2  "chair":1 }`, items in ascending order.
impl<T: Ord + fmt::Display> fmt::Display for ProbabilityDistribution<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{{")?;
		for (i, (item, count)) in self.records.iter().enumerate() {
			if i > 0 {
				write!(f, " ")?;
			}
			write!(f, " \"{}\":{}", item, count)?;
		}
		write!(f, " }}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;
	use crate::model::number_generator::ReplayNumberGenerator;

	fn banana_chair_table() -> ProbabilityDistribution<&'static str> {
		["table", "banana", "chair", "banana"].into_iter().collect()
	}

	#[test]
	fn test_record_counts() {
		let d = banana_chair_table();
		assert_eq!(d.total(), 4);
		assert_eq!(d.len(), 3);
		assert_eq!(d.count(&"banana"), 2);
		assert_eq!(d.count(&"missing"), 0);
		let keys: Vec<_> = d.records().keys().copied().collect();
		assert_eq!(keys, vec!["banana", "chair", "table"]);
	}

	#[test]
	fn test_pick_ranges() {
		let d = banana_chair_table();
		assert_eq!(*d.pick(0).unwrap(), "banana");
		assert_eq!(*d.pick(1).unwrap(), "banana");
		assert_eq!(*d.pick(2).unwrap(), "chair");
		assert_eq!(*d.pick(3).unwrap(), "table");
	}

	#[test]
	fn test_pick_out_of_range() {
		let d = banana_chair_table();
		let err = d.pick(4).unwrap_err();
		assert!(matches!(err, ChainError::IndexOutOfRange { index: 4, total: 4 }));
		assert_eq!(err.kind(), ErrorKind::OutOfRange);
	}

	#[test]
	fn test_pick_empty() {
		let d: ProbabilityDistribution<String> = ProbabilityDistribution::new();
		assert_eq!(d.pick(0).unwrap_err().kind(), ErrorKind::NoSuchElement);
		let mut g = ReplayNumberGenerator::new(vec![0]);
		assert!(matches!(d.pick_with(&mut g), Err(ChainError::EmptyDistribution)));
		// Nothing drawn
		assert_eq!(g.remaining(), 1);
	}

	#[test]
	fn test_index() {
		let d = banana_chair_table();
		assert_eq!(d.index(&"banana").unwrap(), 0);
		assert_eq!(d.index(&"chair").unwrap(), 2);
		assert_eq!(d.index(&"table").unwrap(), 3);
		assert!(matches!(d.index(&"sofa"), Err(ChainError::ItemNotFound)));
	}

	#[test]
	fn test_pick_with_generator() {
		let d = banana_chair_table();
		let mut g = ReplayNumberGenerator::new(vec![3, 1, 9]);
		assert_eq!(*d.pick_with(&mut g).unwrap(), "table");
		assert_eq!(*d.pick_with(&mut g).unwrap(), "banana");
		assert_eq!(d.pick_with(&mut g).unwrap_err().kind(), ErrorKind::OutOfRange);
		assert_eq!(d.pick_with(&mut g).unwrap_err().kind(), ErrorKind::NoSuchElement);
	}

	#[test]
	fn test_merge() {
		let mut d = banana_chair_table();
		let other: ProbabilityDistribution<&str> = ["apple", "chair"].into_iter().collect();
		d.merge(&other);
		assert_eq!(d.total(), 6);
		assert_eq!(d.count(&"chair"), 2);
		assert_eq!(d.index(&"banana").unwrap(), 1);
	}

	#[test]
	fn test_display() {
		assert_eq!(banana_chair_table().to_string(), "{ \"banana\":2  \"chair\":1  \"table\":1 }");
		let single: ProbabilityDistribution<&str> = ["a", "a"].into_iter().collect();
		assert_eq!(single.to_string(), "{ \"a\":2 }");
		assert_eq!(ProbabilityDistribution::<&str>::new().to_string(), "{ }");
	}
}
