use std::sync::Arc;
use std::time::Duration;

use docrag_core::config::Config;
use docrag_embed::get_default_embedder;
use docrag_vector::VectorStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = Arc::from(get_default_embedder(&settings.embedding)?);
    let store = VectorStore::new(embedder, Duration::from_secs(settings.embedding.timeout_secs));
    let path = settings.store.cache_path();
    let loaded = store.load(&path)?;
    let stats = store.stats();
    println!("cache: {} records={} dim={} embedder={}", path.display(), loaded, stats.dim, stats.embedder_id);
    for (source, count) in &stats.per_source {
        println!("  {source}: {count}");
    }
    Ok(())
}
