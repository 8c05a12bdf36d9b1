use docrag_core::config::Config;
use docrag_embed::get_default_embedder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let texts = ["hello world", "rust embeddings"];
    for text in texts {
        let v = embedder.embed(text).await?;
        println!("{:?} -> dim={} first={:?}", text, v.len(), v.iter().take(4).collect::<Vec<_>>());
    }
    println!("embedder={} dim={}", embedder.embedder_id(), embedder.dim());
    Ok(())
}
