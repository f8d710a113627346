use thiserror::Error;

/// Broad category of a `ChainError`.
///
/// Callers that only care about *why* an operation was rejected (bad input,
/// nothing left to produce, index outside the valid range) can match on the
/// kind instead of on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	InvalidArgument,
	NoSuchElement,
	OutOfRange,
	Io,
	Serialization,
}

/// Errors raised by distributions, number generators, walks and chains.
#[derive(Debug, Error)]
pub enum ChainError {
	/// A number generator was asked for a value below a zero bound.
	#[error("Bound must be positive, got {bound}")]
	InvalidBound { bound: usize },

	/// `pick` was called on a distribution with no records.
	#[error("Cannot pick from an empty distribution")]
	EmptyDistribution,

	/// A replay generator has no value left to hand out.
	#[error("Number generator is exhausted")]
	GeneratorExhausted,

	/// `next_token` was called on a finished walk.
	#[error("Walk has no more tokens")]
	WalkFinished,

	/// A pick index outside `[0, total)`.
	#[error("Index {index} out of range for total {total}")]
	IndexOutOfRange { index: usize, total: usize },

	/// A replayed value that does not fit the requested bound.
	#[error("Replayed value {value} does not fit bound {bound}")]
	ValueOutOfBound { value: usize, bound: usize },

	/// `index` was asked for an item the distribution never recorded.
	#[error("Item not found in distribution")]
	ItemNotFound,

	/// The walk reached a token that has no successor distribution.
	#[error("Token '{token}' has no successor distribution")]
	UnknownToken { token: String },

	/// A requested word has no successor distribution, so nothing can follow it.
	#[error("Token '{token}' has no successors")]
	NoSuccessors { token: String },

	/// `find_walk_choices` was given nothing to reproduce.
	#[error("Cannot find choices for an empty walk")]
	EmptyWalk,

	/// The first requested token never started a training sequence.
	#[error("Token '{token}' is not a start token")]
	NotAStartToken { token: String },

	/// `to` was never observed right after `from`.
	#[error("Transition '{from}' -> '{to}' was never recorded")]
	MissingTransition { from: String, to: String },

	/// The last requested token never ended a training sequence.
	#[error("Token '{token}' never ends a sequence")]
	NoTermination { token: String },

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] postcard::Error),
}

impl ChainError {
	/// Returns the broad category of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			ChainError::InvalidBound { .. } => ErrorKind::InvalidArgument,
			ChainError::EmptyDistribution
			| ChainError::GeneratorExhausted
			| ChainError::WalkFinished
			| ChainError::UnknownToken { .. } => ErrorKind::NoSuchElement,
			ChainError::IndexOutOfRange { .. }
			| ChainError::ValueOutOfBound { .. }
			| ChainError::ItemNotFound
			| ChainError::EmptyWalk
			| ChainError::NoSuccessors { .. }
			| ChainError::NotAStartToken { .. }
			| ChainError::MissingTransition { .. }
			| ChainError::NoTermination { .. } => ErrorKind::OutOfRange,
			ChainError::Io(_) => ErrorKind::Io,
			ChainError::Serialization(_) => ErrorKind::Serialization,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_kinds() {
		assert_eq!(ChainError::InvalidBound { bound: 0 }.kind(), ErrorKind::InvalidArgument);
		assert_eq!(ChainError::GeneratorExhausted.kind(), ErrorKind::NoSuchElement);
		assert_eq!(ChainError::EmptyWalk.kind(), ErrorKind::OutOfRange);
		assert_eq!(ChainError::NoSuccessors { token: "x".to_owned() }.kind(), ErrorKind::OutOfRange);
		assert_eq!(ChainError::UnknownToken { token: "x".to_owned() }.kind(), ErrorKind::NoSuchElement);
		assert_eq!(
			ChainError::IndexOutOfRange { index: 4, total: 4 }.kind(),
			ErrorKind::OutOfRange
		);
	}

	#[test]
	fn test_messages() {
		let e = ChainError::MissingTransition { from: "a".to_owned(), to: "b".to_owned() };
		assert_eq!(e.to_string(), "Transition 'a' -> 'b' was never recorded");
		let e = ChainError::IndexOutOfRange { index: 7, total: 3 };
		assert_eq!(e.to_string(), "Index 7 out of range for total 3");
	}
}
