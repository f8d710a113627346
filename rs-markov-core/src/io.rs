use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a pre-tokenized corpus file.
///
/// - One sequence per line (`\n` / `\r\n`)
/// - Tokens separated by whitespace, kept verbatim
/// - Blank lines become empty sequences
pub fn read_corpus<P: AsRef<Path>>(filename: P) -> io::Result<Vec<Vec<String>>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(parse_corpus(&contents))
}

/// Splits corpus text into sequences of tokens, see `read_corpus`.
pub fn parse_corpus(contents: &str) -> Vec<Vec<String>> {
	contents
		.lines()
		.map(|line| line.split_whitespace().map(str::to_owned).collect())
		.collect()
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.dat` + `"bin"` → `data/input.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/tweets.dat"` → `"tweets"`
/// - `"tweets.dat"` → `"tweets"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// `"."` or `"./"` resolves to the current working directory.
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory, sorted by name.
///
/// Returns file names only (no paths).
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_corpus() {
		let corpus = parse_corpus("a table and a chair\r\n\na banana ! and a banana ?\n");
		assert_eq!(corpus.len(), 3);
		assert_eq!(corpus[0], vec!["a", "table", "and", "a", "chair"]);
		assert!(corpus[1].is_empty());
		assert_eq!(corpus[2].len(), 7);
	}

	#[test]
	fn test_build_output_path() {
		let out = build_output_path("data/tweets.dat", "bin").unwrap();
		assert_eq!(out, PathBuf::from("data/tweets.bin"));
		assert!(build_output_path("", "bin").is_err());
	}

	#[test]
	fn test_get_filename() {
		assert_eq!(get_filename("./data/tweets.dat").unwrap(), "tweets");
		assert_eq!(get_filename("tweets.dat").unwrap(), "tweets");
	}

	#[test]
	fn test_normalize_folder() {
		assert_eq!(normalize_folder("data"), PathBuf::from("data"));
		assert_eq!(normalize_folder("./"), env::current_dir().unwrap());
	}
}
