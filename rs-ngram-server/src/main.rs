use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer, Responder};
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

use rs_ngram_core::io::{list_files, parse_corpus};
use rs_ngram_core::smoothing::{GoodTuringSmoothing, LaplaceSmoothing, NoSmoothing, SimpleSmoothing};
use rs_ngram_core::{Generator, NGramModel, StartSeed, TextCodec};

/// Folder holding the `*.ngram` text models.
const DATA_DIR: &str = "./data";

/// Query parameters of the `/v1/generate` endpoint.
#[derive(Deserialize)]
struct GenerateParams {
	max_length: Option<usize>,
	seed: Option<u64>,
	start: Option<String>, // none, random:<length> or custom:<symbols>
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
	order: Option<usize>,
	smoothing: Option<String>,
}

#[derive(Deserialize)]
struct SymbolsQuery {
	symbols: Option<String>,
}

#[derive(Default)]
struct SharedData {
	model: Option<NGramModel<String>>,
	names: Vec<String>,
}

impl GenerateParams {
	/// Parses the `start` parameter into a start seed.
	fn start_seed(&self) -> Result<StartSeed<String>, String> {
		match &self.start {
			None => Ok(StartSeed::Empty),
			Some(s) if s.to_lowercase() == "none" => Ok(StartSeed::Empty),
			Some(s) if s.to_lowercase().starts_with("custom:") => {
				let symbols: Vec<String> = s["custom:".len()..].split_whitespace().map(str::to_owned).collect();
				if symbols.is_empty() {
					Err("Custom start cannot be empty".into())
				} else {
					Ok(StartSeed::Custom(symbols))
				}
			}
			Some(s) if s.to_lowercase().starts_with("random:") => match s["random:".len()..].parse::<usize>() {
				Ok(n) => Ok(StartSeed::Random(n)),
				Err(_) => Err("Random start length must be an integer".into()),
			},
			Some(_) => Err("Start must be 'none', 'random:<length>' or 'custom:<symbols>'".into()),
		}
	}
}

impl ModelQuery {
	fn smoothing(&self) -> Result<Box<dyn SimpleSmoothing<String>>, String> {
		match self.smoothing.as_deref().map(str::to_lowercase).as_deref() {
			None | Some("none") => Ok(Box::new(NoSmoothing)),
			Some("laplace") => Ok(Box::new(LaplaceSmoothing::new())),
			Some("good-turing") => Ok(Box::new(GoodTuringSmoothing)),
			Some(other) => Err(format!("Unknown smoothing '{other}'")),
		}
	}
}

impl SymbolsQuery {
	fn symbols(&self) -> Result<Vec<String>, String> {
		let symbols: Vec<String> = self
			.symbols
			.as_deref()
			.unwrap_or_default()
			.split_whitespace()
			.map(str::to_owned)
			.collect();
		if symbols.is_empty() {
			Err("Missing or empty symbols".into())
		} else {
			Ok(symbols)
		}
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Draws one sequence from the loaded model. The same `seed` always gives
/// the same sequence; without it the generator is seeded from the OS.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let start_seed = match query.start_seed() {
		Ok(s) => s,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let mut rng = match query.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let Some(model) = &shared_data.model else {
		return HttpResponse::BadRequest().body("No model loaded");
	};

	let mut generator = Generator::new(model).with_end("</s>".to_owned());
	if let Some(max_length) = query.max_length {
		generator = generator.with_max_length(max_length);
	}
	match generator.generate(&start_seed, &mut rng) {
		Some(sequence) => HttpResponse::Ok().body(sequence.join(" ")),
		None => HttpResponse::NotFound().body("No start found in the model"),
	}
}

/// HTTP GET endpoint `/v1/probability`
#[get("/v1/probability")]
async fn get_probability(data: web::Data<Mutex<SharedData>>, query: web::Query<SymbolsQuery>) -> impl Responder {
	let symbols = match query.symbols() {
		Ok(s) => s,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match &shared_data.model {
		Some(model) => HttpResponse::Ok().body(model.probability(&symbols).to_string()),
		None => HttpResponse::BadRequest().body("No model loaded"),
	}
}

/// HTTP GET endpoint `/v1/count`
#[get("/v1/count")]
async fn get_count(data: web::Data<Mutex<SharedData>>, query: web::Query<SymbolsQuery>) -> impl Responder {
	let symbols = match query.symbols() {
		Ok(s) => s,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match &shared_data.model {
		Some(model) => HttpResponse::Ok().body(model.count(&symbols).to_string()),
		None => HttpResponse::BadRequest().body("No model loaded"),
	}
}

/// HTTP POST endpoint `/v1/perplexity`
///
/// The body holds one tokenized sentence per line.
#[post("/v1/perplexity")]
async fn post_perplexity(data: web::Data<Mutex<SharedData>>, body: String) -> impl Responder {
	let corpus = parse_corpus(&body);
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match &shared_data.model {
		Some(model) => HttpResponse::Ok().body(model.perplexity(&corpus).to_string()),
		None => HttpResponse::BadRequest().body("No model loaded"),
	}
}

#[get("/v1/models")]
async fn get_models() -> impl Responder {
	match list_files(DATA_DIR, "ngram") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models"),
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.names.join("\n"))
}

#[put("/v1/load_models")]
async fn put_model(data: web::Data<Mutex<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let smoothing = match query.smoothing() {
		Ok(s) => s,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};
	let model_names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();

	let codec = TextCodec::<String>::new();
	let mut merged: Option<NGramModel<String>> = None;
	for name in &model_names {
		let model_path = format!("{DATA_DIR}/{name}.ngram");
		let partial_model = match NGramModel::open_cached(&model_path, &codec) {
			Ok(m) => m,
			Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load model: {e}")),
		};
		if query.order.is_some_and(|order| order != partial_model.order()) {
			return HttpResponse::BadRequest().body(format!("Model '{name}' has order {}", partial_model.order()));
		}
		match &mut merged {
			None => merged = Some(partial_model),
			Some(model) => {
				if !model.merge(&partial_model) {
					warn!("model '{name}' has order {}, expected {}", partial_model.order(), model.order());
					return HttpResponse::BadRequest().body(format!("Model '{name}' order does not match"));
				}
			}
		}
	}

	let Some(mut model) = merged else {
		return HttpResponse::BadRequest().body("Missing or empty model name");
	};
	if let Err(e) = model.compute_probabilities(smoothing.as_ref()) {
		return HttpResponse::InternalServerError().body(format!("Failed to smooth model: {e}"));
	}

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	info!("serving {}-gram model from {}", model.order(), model_names.join(", "));
	shared_data.model = Some(model);
	shared_data.names = model_names.iter().map(|s| s.to_string()).collect();

	HttpResponse::Ok().body("Models loaded successfully")
}

/// Main entry point for the server.
///
/// Starts with no model; `PUT /v1/load_models` loads one from `./data`.
/// The shared state sits behind a `Mutex` and the server binds to
/// 127.0.0.1:5000.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let shared_model = web::Data::new(Mutex::new(SharedData::default()));
	info!("listening on 127.0.0.1:5000, models in {DATA_DIR}");

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(get_probability)
			.service(get_count)
			.service(post_perplexity)
			.service(get_models)
			.service(put_model)
			.service(get_loaded_models)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
