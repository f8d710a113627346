use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::{env, io};

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use log::{info, warn};
use serde::Deserialize;
use rs_markov_core::io::{get_filename, list_files, normalize_folder};
use rs_markov_core::{ChainError, MarkovChain, NumberGenerator, RandomNumberGenerator};

/// Corpus folder used when `RS_MARKOV_DATA` is not set.
const DEFAULT_DATA: &str = "./data";

/// Bind address used when `RS_MARKOV_BIND` is not set.
const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Upper bound on walks returned by a single request.
const MAX_WALKS: usize = 100;

/// Query parameters for the `/v1/walk` endpoint
#[derive(Deserialize)]
struct WalkParams {
	count: Option<usize>,
	seed: Option<u64>
}

/// Query parameters for the `/v1/choices` endpoint
#[derive(Deserialize)]
struct ChoicesParams {
	/// Space-separated tokens
	words: Option<String>
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>
}

/// Server settings read from the environment.
struct Settings {
	data: PathBuf,
	bind: String
}

impl Settings {
	fn from_env() -> Self {
		let data = env::var("RS_MARKOV_DATA").unwrap_or_else(|_| DEFAULT_DATA.to_owned());
		let bind = env::var("RS_MARKOV_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_owned());
		Self { data: normalize_folder(&data), bind }
	}
}

struct SharedData {
	chain: MarkovChain,
	model_names: Vec<String>,
	data: PathBuf
}

/// Runs `count` walks, each on its own generator.
fn walks(chain: &MarkovChain, count: usize, seed: Option<u64>) -> Result<Vec<String>, ChainError> {
	let mut lines = Vec::with_capacity(count);
	for i in 0..count {
		let generator: Box<dyn NumberGenerator> = match seed {
			Some(seed) => Box::new(RandomNumberGenerator::seeded(seed.wrapping_add(i as u64))),
			None => Box::new(RandomNumberGenerator::new()),
		};
		lines.push(chain.get_walk(generator).collect_tokens()?.join(" "));
	}
	Ok(lines)
}

/// GET /v1/walk
///
/// Returns one random walk per line, tokens separated by spaces.
#[get("/v1/walk")]
async fn get_walk(data: web::Data<RwLock<SharedData>>, query: web::Query<WalkParams>) -> impl Responder {
	let count = query.count.unwrap_or(1);
	if count == 0 || count > MAX_WALKS {
		return HttpResponse::BadRequest().body(format!("count must be between 1 and {}", MAX_WALKS));
	}

	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};
	if shared_data.chain.is_empty() {
		return HttpResponse::Conflict().body("No chain loaded");
	}

	match walks(&shared_data.chain, count, query.seed) {
		Ok(lines) => HttpResponse::Ok().body(lines.join("\n")),
		Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

/// GET /v1/choices
///
/// Returns the choices reproducing `words`, comma separated.
#[get("/v1/choices")]
async fn get_choices(data: web::Data<RwLock<SharedData>>, query: web::Query<ChoicesParams>) -> impl Responder {
	let words: Vec<&str> = match &query.words {
		Some(s) => s.split_whitespace().collect(),
		None => return HttpResponse::BadRequest().body("Missing words"),
	};

	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};

	match shared_data.chain.find_walk_choices(words.as_slice()) {
		Ok(choices) => {
			let choices: Vec<String> = choices.iter().map(usize::to_string).collect();
			HttpResponse::Ok().body(choices.join(","))
		}
		Err(e) => HttpResponse::BadRequest().body(e.to_string()),
	}
}

/// GET /v1/chain
///
/// Returns the textual dump of the loaded chain.
#[get("/v1/chain")]
async fn get_chain(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	match data.read() {
		Ok(shared_data) => HttpResponse::Ok().body(shared_data.chain.to_string()),
		Err(_) => HttpResponse::InternalServerError().body("Chain lock failed"),
	}
}

#[get("/v1/models")]
async fn get_models(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let folder = match data.read() {
		Ok(shared_data) => shared_data.data.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};
	match available_models(&folder) {
		Ok(names) => HttpResponse::Ok().body(names.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models")
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};
	HttpResponse::Ok().body(shared_data.model_names.join("\n"))
}

/// Splits a comma-separated list of model names, dropping blanks.
fn parse_model_names(names: Option<&str>) -> Vec<String> {
	names
		.unwrap_or_default()
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.map(str::to_owned)
		.collect()
}

/// Names of the corpora available in `folder`, without extension.
fn available_models(folder: &Path) -> io::Result<Vec<String>> {
	list_files(folder, "dat")?.iter().map(get_filename).collect()
}

/// Opens every named corpus of `folder` and merges them into one chain.
///
/// Returns the chain and the names of the files it was built from.
fn load_chain(folder: &Path, names: &[String]) -> Result<(MarkovChain, Vec<String>), ChainError> {
	let mut chain = MarkovChain::new();
	let mut loaded = Vec::with_capacity(names.len());
	for name in names {
		let model_path = folder.join(format!("{}.dat", name));
		let partial_chain = MarkovChain::open(&model_path)
			.inspect_err(|e| warn!("failed to load {}: {}", model_path.display(), e))?;
		chain.merge(&partial_chain);
		loaded.push(get_filename(&model_path)?);
	}
	Ok((chain, loaded))
}

/// PUT /v1/load_models
///
/// Replaces the loaded chain with the merge of the named corpora.
/// Corpora are read and trained on the blocking pool; the write lock is
/// only held to swap the new chain in.
#[put("/v1/load_models")]
async fn put_model(data: web::Data<RwLock<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let model_names = parse_model_names(query.names.as_deref());
	if model_names.is_empty() {
		return HttpResponse::BadRequest().body("Missing or empty model name");
	}

	let folder = match data.read() {
		Ok(shared_data) => shared_data.data.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};

	let (chain, loaded) = match web::block(move || load_chain(&folder, &model_names)).await {
		Ok(Ok(result)) => result,
		Ok(Err(e)) => return HttpResponse::InternalServerError().body(format!("Failed to load model: {e}")),
		Err(_) => return HttpResponse::InternalServerError().body("Loading task failed"),
	};

	let mut shared_data = match data.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};
	info!("loaded models: {}", loaded.join(", "));
	shared_data.chain = chain;
	shared_data.model_names = loaded;

	HttpResponse::Ok().body("Models loaded successfully")
}

/// Main entry point for the server.
///
/// Starts with an empty chain; corpora are loaded with `PUT /v1/load_models`.
/// Settings come from `RS_MARKOV_DATA` and `RS_MARKOV_BIND`, logging from
/// `RUST_LOG`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();
	let settings = Settings::from_env();
	info!("serving corpora from {} on {}", settings.data.display(), settings.bind);

	let shared_data = SharedData {
		chain: MarkovChain::new(),
		model_names: Vec::new(),
		data: settings.data
	};
	let shared_chain = web::Data::new(RwLock::new(shared_data));

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_chain.clone())
			.service(get_walk)
			.service(get_choices)
			.service(get_chain)
			.service(get_models)
			.service(put_model)
			.service(get_loaded_models)
	})
		.bind(settings.bind)?
		.run()
		.await
}
