use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use docrag_complete::get_default_completer;
use docrag_core::api::{AnswerResponse, ErrorResponse, QueryRequest, SearchResponse};
use docrag_core::config::{resolve_with_base, Config, Settings};
use docrag_core::data_processor::DataProcessor;
use docrag_core::types::Meta;
use docrag_core::Error;
use docrag_embed::get_default_embedder;
use docrag_pipeline::context::enrich_from_store;
use docrag_pipeline::{AnswerGenerator, ChatMessage, Retriever, StreamingSession};
use docrag_vector::VectorStore;

const USAGE: &str = "Usage: docrag <command> [args...]

Commands:
  ingest [DIR] [--limit N]      embed every .txt file under DIR and save the cache
  add <TEXT> [--source NAME]    add a single document
  query <QUERY> [--limit N]     print ranked results as JSON
  ask <QUERY>                   print a generated answer as JSON
  stream <QUERY>                print the answer as server-sent events
  enrich <MESSAGES.json>        add documentation context to a chat transcript
  cache inspect|clear           show or delete the embeddings cache";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{}", USAGE); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

/// Remove `--name VALUE` from `args` and return VALUE.
fn take_flag(args: &mut Vec<String>, name: &str) -> anyhow::Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == name) else { return Ok(None) };
    if pos + 1 >= args.len() { anyhow::bail!("{} requires a value", name); }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

fn take_usize_flag(args: &mut Vec<String>, name: &str) -> anyhow::Result<Option<usize>> {
    take_flag(args, name)?
        .map(|v| v.parse::<usize>().map_err(|_| anyhow::anyhow!("{} requires a number", name)))
        .transpose()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

struct App {
    store: Arc<VectorStore>,
    retriever: Arc<Retriever>,
    generator: Arc<AnswerGenerator>,
    cache_path: PathBuf,
}

impl App {
    fn build(settings: Settings) -> anyhow::Result<Self> {
        let embedder = Arc::from(get_default_embedder(&settings.embedding)?);
        let completer = Arc::from(get_default_completer(&settings.completion)?);
        let store = Arc::new(VectorStore::new(embedder, Duration::from_secs(settings.embedding.timeout_secs)));
        let retriever = Arc::new(Retriever::from_settings(store.clone(), &settings));
        let generator = Arc::new(AnswerGenerator::new(completer, Duration::from_secs(settings.completion.timeout_secs)));
        let cache_path = settings.store.cache_path();
        let app = Self { store, retriever, generator, cache_path };
        app.load_cache()?;
        Ok(app)
    }

    /// A corrupt cache is dropped with a warning; one built by another
    /// embedder is fatal.
    fn load_cache(&self) -> anyhow::Result<()> {
        match self.store.load(&self.cache_path) {
            Ok(0) => {}
            Ok(n) => println!("📦 Loaded {} cached embeddings from {}", n, self.cache_path.display()),
            Err(e @ Error::CacheCorrupt { .. }) => eprintln!("⚠️  {}; starting with an empty store", e),
            Err(e @ Error::DimensionMismatch { .. }) => {
                anyhow::bail!("{} (cache {}); run `docrag cache clear` to rebuild", e, self.cache_path.display())
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn save_cache(&self) -> anyhow::Result<()> {
        self.store.save(&self.cache_path)?;
        println!("💾 Saved {} embeddings to {}", self.store.len(), self.cache_path.display());
        Ok(())
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report a user-facing failure as an `ErrorResponse` and exit non-zero.
fn fail(e: &Error) -> ! {
    let body = serde_json::to_string_pretty(&ErrorResponse::from(e)).unwrap_or_else(|_| e.to_string());
    println!("{}", body);
    std::process::exit(1)
}

async fn ingest(config: &Config, settings: Settings, mut args: Vec<String>) -> anyhow::Result<()> {
    let limit = take_usize_flag(&mut args, "--limit")?;
    let cwd = env::current_dir()?;
    let data_dir = match args.first() {
        Some(dir) => resolve_with_base(&cwd, dir),
        None => resolve_with_base(&cwd, config.get::<String>("data.txt_dir").unwrap_or_else(|_| "data".to_string())),
    };
    println!("Ingesting from {}", data_dir.display());

    let processor = match limit { Some(n) => DataProcessor::with_limit(n), None => DataProcessor::new() };
    let documents = processor.load_directory(&data_dir)?;
    if documents.is_empty() { println!("No .txt documents found"); return Ok(()); }

    let app = App::build(settings)?;
    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut chunks = 0usize;
    for doc in documents {
        let source = doc.metadata.get("source").cloned().unwrap_or_default();
        pb.set_message(source);
        chunks += app.retriever.add_document(&doc.text, doc.metadata).await?.len();
        pb.inc(1);
    }
    pb.finish_with_message("✅ embedding complete");
    app.save_cache()?;
    println!("📊 Ingested {} chunks ({} records in store)", chunks, app.store.len());
    Ok(())
}

async fn add(settings: Settings, mut args: Vec<String>) -> anyhow::Result<()> {
    let source = take_flag(&mut args, "--source")?;
    let Some(text) = args.first().cloned() else { anyhow::bail!("Usage: docrag add \"<text>\" [--source NAME]") };
    let app = App::build(settings)?;
    let mut metadata = Meta::new();
    if let Some(source) = source { metadata.insert("source".to_string(), source); }
    let ids = app.retriever.add_document(&text, metadata).await?;
    println!("✅ Added {} chunk(s)", ids.len());
    app.save_cache()
}

async fn query(settings: Settings, mut args: Vec<String>) -> anyhow::Result<()> {
    let limit = take_usize_flag(&mut args, "--limit")?;
    let request = QueryRequest { query: args.first().cloned(), request_type: Some("search".to_string()), top_k: limit };
    let app = App::build(settings)?;
    let outcome = async {
        let q = request.validated_query()?;
        let top_k = request.validated_top_k(app.retriever.top_k())?;
        let results = app.retriever.query(q, top_k).await?;
        Ok::<_, Error>(SearchResponse { query: q.to_string(), results })
    }
    .await;
    match outcome {
        Ok(response) => print_json(&response),
        Err(e) => fail(&e),
    }
}

async fn ask(settings: Settings, args: Vec<String>) -> anyhow::Result<()> {
    let request = QueryRequest { query: args.first().cloned(), request_type: Some("user_query".to_string()), top_k: None };
    let app = App::build(settings)?;
    let q = match request.validated_query() { Ok(q) => q, Err(e) => fail(&e) };
    let results = match app.retriever.query_default(q).await { Ok(r) => r, Err(e) => fail(&e) };
    let answer = app.generator.generate(q, &results).await;
    print_json(&AnswerResponse { answer: answer.text, sources: answer.sources, result_count: results.len() })
}

async fn stream(settings: Settings, args: Vec<String>) -> anyhow::Result<()> {
    let query = args.first().cloned().unwrap_or_default();
    let session_settings = settings.session.clone();
    let app = App::build(settings)?;
    let mut events = StreamingSession::new(query, app.retriever.clone(), app.generator.clone())
        .with_settings(session_settings)
        .into_stream();
    while let Some(event) = events.next().await {
        print!("{}", event.to_sse_frame());
    }
    Ok(())
}

async fn enrich(settings: Settings, args: Vec<String>) -> anyhow::Result<()> {
    let Some(path) = args.first() else { anyhow::bail!("Usage: docrag enrich <MESSAGES.json>") };
    let raw = std::fs::read_to_string(path)?;
    let messages: Vec<ChatMessage> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not a JSON array of {{role, content}} messages: {}", path, e))?;
    let app = App::build(settings)?;
    let enriched = enrich_from_store(&app.retriever, &messages).await;
    if enriched.len() == messages.len() { eprintln!("No sufficiently relevant documentation found"); }
    print_json(&enriched)
}

fn cache(settings: Settings, args: Vec<String>) -> anyhow::Result<()> {
    let path = settings.store.cache_path();
    match args.first().map(String::as_str) {
        Some("inspect") => {
            let app = App::build(settings)?;
            println!("Cache: {}", path.display());
            print_json(&app.store.stats())
        }
        Some("clear") => clear_cache(&path),
        _ => anyhow::bail!("Usage: docrag cache inspect|clear"),
    }
}

fn clear_cache(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
        println!("🗑️  Removed {}", path.display());
    } else {
        println!("No cache at {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => ingest(&config, settings, args).await,
        "add" => add(settings, args).await,
        "query" => query(settings, args).await,
        "ask" => ask(settings, args).await,
        "stream" => stream(settings, args).await,
        "enrich" => enrich(settings, args).await,
        "cache" => cache(settings, args),
        _ => { eprintln!("Unknown command: {}\n\n{}", cmd, USAGE); std::process::exit(1); }
    }
}
