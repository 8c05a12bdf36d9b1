use docrag_core::config::EmbeddingSettings;
use docrag_core::traits::Embedder;
use docrag_embed::{embedder_for, get_default_embedder, FakeEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { provider: "fake".to_string(), dimension: 256, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let v1 = embedder.embed("hello world").await.expect("embed");
    let v2 = embedder.embed("hello world").await.expect("embed");

    assert_eq!(v1.len(), 256, "embedding dim follows config");
    assert_eq!(embedder.dim(), 256);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn related_words_score_higher_than_unrelated() {
    let embedder = FakeEmbedder::default();
    let doc = embedder.embed_sync("Authentication requires an API key in the X-API-Key header.");
    let related = embedder.embed_sync("How do I authenticate?");
    let unrelated = embedder.embed_sync("Forms support drag and drop builders");
    assert!(cosine(&doc, &related) > 0.3, "shared stems give a strong match");
    assert!(cosine(&doc, &related) > cosine(&doc, &unrelated));
}

#[test]
fn empty_text_is_zero_vector() {
    let v = FakeEmbedder::new(32).embed_sync("  ...  ");
    assert!(v.iter().all(|x| *x == 0.0));
}

#[test]
fn unknown_provider_is_config_error() {
    let settings = EmbeddingSettings { provider: "carrier-pigeon".to_string(), ..EmbeddingSettings::default() };
    assert!(matches!(embedder_for(&settings, false), Err(docrag_core::Error::InvalidConfig(_))));
}

#[test]
fn fake_override_wins_over_provider() {
    let settings = EmbeddingSettings { provider: "carrier-pigeon".to_string(), dimension: 16, ..EmbeddingSettings::default() };
    let embedder = embedder_for(&settings, true).expect("fake embedder");
    assert_eq!(embedder.dim(), 16);
}
