use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::distribution::ProbabilityDistribution;
use super::number_generator::{NumberGenerator, RandomNumberGenerator};
use super::walk::WalkIterator;
use crate::error::ChainError;
use crate::io::{build_output_path, read_corpus};

/// End of sequence marker.
pub const END_TOKEN: &str = "<END>";

/// First-order Markov chain over string tokens.
///
/// The chain tracks which tokens start a sequence and, for every token, how
/// often each other token (or `END_TOKEN`) follows it.
///
/// Training on `["a", "table", "and", "a", "chair"]` and
/// `["a", "banana", "!", "and", "a", "banana", "?"]` renders as:
///
/// ```text
/// startTokens: { "a":2 }
/// bigramFrequencies:
/// "!":	{ "and":1 }
/// "?":	{ "<END>":1 }
/// "a":	{ "banana":2  "chair":1  "table":1 }
/// "and":	{ "a":2 }
/// "banana":	{ "!":1  "?":1 }
/// "chair":	{ "<END>":1 }
/// "table":	{ "and":1 }
/// ```
///
/// # Invariants
/// - Every token seen in training has exactly one successor distribution
/// - The last token of every trained sequence has `END_TOKEN` among its successors
/// - Tables are ordered, so `pick`/`index` agree across runs and processes
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkovChain {
	/// Distribution of the first token of each sequence
	start_tokens: ProbabilityDistribution<String>,

	/// For each token, distribution of the token that follows it
	bigram_frequencies: BTreeMap<String, ProbabilityDistribution<String>>,
}

impl MarkovChain {
	/// Creates an empty chain that can later be trained.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a chain trained on every sequence of `corpus`, in order.
	pub fn from_corpus<C, S, T>(corpus: C) -> Self
	where
		C: IntoIterator<Item = S>,
		S: IntoIterator<Item = T>,
		T: Into<String>,
	{
		let mut chain = Self::new();
		for sequence in corpus {
			chain.add_sequence(sequence);
		}
		chain
	}

	/// Trains a chain on `corpus` using one thread per chunk.
	///
	/// # Behavior
	/// - Splits the corpus into chunks (based on CPU cores * factor).
	/// - Spawns threads to build partial chains for each chunk.
	/// - Merges all partial chains sequentially.
	///
	/// The result is identical to `from_corpus`: counts are plain sums.
	pub fn train_parallel(corpus: Vec<Vec<String>>) -> Self {
		if corpus.is_empty() {
			return Self::new();
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = corpus.len().div_ceil(chunks).max(1);

		let (tx, rx) = mpsc::channel();
		for chunk in corpus.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<Vec<String>> = chunk.to_vec();

			thread::spawn(move || {
				let partial_chain = MarkovChain::from_corpus(chunk);
				if tx.send(partial_chain).is_err() {
					warn!("partial chain dropped, receiver is gone");
				}
			});
		}
		drop(tx);

		let mut final_chain = MarkovChain::new();
		for partial_chain in rx.iter() {
			final_chain.merge(&partial_chain);
		}

		debug!(
			"trained {} sequences in {} chunks, {} distinct tokens",
			corpus.len(),
			corpus.len().div_ceil(chunk_size),
			final_chain.bigram_frequencies.len()
		);
		final_chain
	}

	/// Opens a chain for a pre-tokenized corpus file.
	///
	/// - If a sibling `.bin` file exists, it is loaded with `postcard`.
	/// - Otherwise the corpus is read, trained in parallel, and cached to
	///   that `.bin` file for future fast loading.
	///
	/// # Errors
	/// I/O and serialization failures.
	pub fn open<P: AsRef<Path>>(filepath: P) -> Result<Self, ChainError> {
		let binary_data_path = build_output_path(&filepath, "bin")?;
		if binary_data_path.exists() {
			return Self::load(binary_data_path);
		}

		let corpus = read_corpus(&filepath)?;
		let chain = Self::train_parallel(corpus);
		chain.save(&binary_data_path)?;
		Ok(chain)
	}

	/// Loads a chain serialized with `save`.
	pub fn load<P: AsRef<Path>>(filepath: P) -> Result<Self, ChainError> {
		let bytes = std::fs::read(&filepath)?;
		let chain: Self = postcard::from_bytes(&bytes)?;
		debug!("loaded chain from {}", filepath.as_ref().display());
		Ok(chain)
	}

	/// Serializes the chain with `postcard`.
	pub fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<(), ChainError> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(&filepath, bytes)?;
		debug!("saved chain to {}", filepath.as_ref().display());
		Ok(())
	}

	/// Records that `second` directly follows `first`.
	///
	/// Creates the successor distribution of `first` on its first occurrence.
	pub fn add_bigram(&mut self, first: &str, second: &str) {
		match self.bigram_frequencies.get_mut(first) {
			Some(successors) => successors.record(second.to_owned()),
			None => {
				let mut successors = ProbabilityDistribution::new();
				successors.record(second.to_owned());
				self.bigram_frequencies.insert(first.to_owned(), successors);
			}
		}
	}

	/// Trains the chain on one sequence.
	///
	/// - Records the first token in the start distribution
	/// - Records each pair of adjacent tokens
	/// - Records a final pair of the last token and `END_TOKEN`
	///
	/// An empty sequence changes nothing.
	pub fn add_sequence<S, T>(&mut self, sequence: S)
	where
		S: IntoIterator<Item = T>,
		T: Into<String>,
	{
		let mut previous: Option<String> = None;
		for token in sequence {
			let token = token.into();
			match &previous {
				None => self.start_tokens.record(token.clone()),
				Some(prev) => self.add_bigram(prev, &token),
			}
			previous = Some(token);
		}

		if let Some(last) = previous {
			self.add_bigram(&last, END_TOKEN);
		}
	}

	/// Successor distribution of `token`, if it was ever seen.
	pub fn get(&self, token: &str) -> Option<&ProbabilityDistribution<String>> {
		self.bigram_frequencies.get(token)
	}

	pub fn start_tokens(&self) -> &ProbabilityDistribution<String> {
		&self.start_tokens
	}

	pub fn bigram_frequencies(&self) -> &BTreeMap<String, ProbabilityDistribution<String>> {
		&self.bigram_frequencies
	}

	/// True if the chain was never trained on a non-empty sequence.
	pub fn is_empty(&self) -> bool {
		self.start_tokens.is_empty()
	}

	/// Walk following the path chosen by `generator`.
	///
	/// See `WalkIterator` for the details.
	pub fn get_walk<G: NumberGenerator>(&self, generator: G) -> WalkIterator<'_, G> {
		WalkIterator::new(&self.start_tokens, &self.bigram_frequencies, generator)
	}

	/// Walk following a uniformly random path.
	pub fn get_random_walk(&self) -> WalkIterator<'_, RandomNumberGenerator> {
		self.get_walk(RandomNumberGenerator::new())
	}

	/// Choices that make `get_walk` produce exactly `words`, then stop.
	///
	/// The result holds one more value than `words` (the final one selects
	/// `END_TOKEN`). `words` itself is left untouched.
	///
	/// # Errors
	/// - `EmptyWalk` if `words` is empty
	/// - `NotAStartToken` if `words[0]` never started a sequence
	/// - `NoSuccessors` if a word other than the last has no successor distribution
	/// - `MissingTransition` if a pair of adjacent words was never observed
	/// - `NoTermination` if the last word never ended a sequence
	pub fn find_walk_choices<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<usize>, ChainError> {
		let Some(first) = words.first() else {
			return Err(ChainError::EmptyWalk);
		};
		let first = first.as_ref();

		let mut choices = Vec::with_capacity(words.len() + 1);
		let start = self
			.start_tokens
			.index(&first.to_owned())
			.map_err(|_| ChainError::NotAStartToken { token: first.to_owned() })?;
		choices.push(start);

		let targets = words[1..].iter().map(|w| w.as_ref()).chain(std::iter::once(END_TOKEN));
		let mut current = first;
		for next in targets {
			let successors = self
				.get(current)
				.ok_or_else(|| ChainError::NoSuccessors { token: current.to_owned() })?;
			let choice = successors.index(&next.to_owned()).map_err(|_| {
				if next == END_TOKEN {
					ChainError::NoTermination { token: current.to_owned() }
				} else {
					ChainError::MissingTransition { from: current.to_owned(), to: next.to_owned() }
				}
			})?;
			choices.push(choice);
			current = next;
		}

		Ok(choices)
	}

	/// Merges another chain into this one.
	///
	/// Counts of matching start tokens and transitions are summed; new
	/// tokens are cloned in.
	pub fn merge(&mut self, other: &Self) {
		self.start_tokens.merge(&other.start_tokens);
		for (token, successors) in &other.bigram_frequencies {
			if let Some(existing) = self.bigram_frequencies.get_mut(token) {
				existing.merge(successors);
			} else {
				self.bigram_frequencies.insert(token.clone(), successors.clone());
			}
		}
	}
}

impl fmt::Display for MarkovChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "startTokens: {}", self.start_tokens)?;
		writeln!(f)?;
		writeln!(f, "bigramFrequencies:")?;
		for (token, successors) in &self.bigram_frequencies {
			writeln!(f, "\"{}\":\t{}", token, successors)?;
		}
		Ok(())
	}
}
