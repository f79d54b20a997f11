//! Tests for `artifact` module

use super::artifact::{ModelArtifact, ARTIFACT_MAGIC, ARTIFACT_VERSION};
use super::config::{LimitsConfig, ModelConfig};
use super::error::{Error, ErrorKind};
use super::recipe::{Recipe, RecipeId};
use super::validation::Preferences;

use tempfile::TempDir;

// -------------------------------------------------------------------------
// Helper functions
// -------------------------------------------------------------------------

const INGREDIENTS: [&str; 8] = [
    "pasta", "garlic", "onion", "tomato", "cheese", "basil", "butter", "flour",
];

/// Thirty recipes spread over quick/simple, medium, and slow/involved.
pub(crate) fn sample_corpus() -> Vec<Recipe> {
    (0..30usize)
        .map(|i| {
            let band = i % 3;
            let minutes = [10.0, 45.0, 150.0][band] + (i / 3) as f64;
            let n_ingredients = [2, 5, 8][band];
            let n_steps = [1, 4, 9][band] + (i / 10);
            let ingredients: Vec<String> = INGREDIENTS[..n_ingredients]
                .iter()
                .map(ToString::to_string)
                .collect();
            let steps: Vec<String> = (0..n_steps).map(|s| format!("step {s}")).collect();
            let name = match band {
                0 => format!("Quick Pasta {i}"),
                1 => format!("Weeknight Stew {i}"),
                _ => format!("Sunday Roast {i}"),
            };
            Recipe::new(i, name, minutes, ingredients, steps)
        })
        .collect()
}

pub(crate) fn config(k: usize) -> ModelConfig {
    ModelConfig {
        n_clusters: k,
        n_init: 4,
        ..ModelConfig::default()
    }
}

fn prefs(time: f64, complexity: f64, ingredients: f64, n: usize) -> Preferences {
    Preferences::validate(time, complexity, ingredients, n, &LimitsConfig::default())
        .expect("valid preferences")
}

// -------------------------------------------------------------------------
// Fitting
// -------------------------------------------------------------------------

#[test]
fn test_fit_labels_every_record() {
    let artifact = ModelArtifact::fit(sample_corpus(), &config(3)).expect("fit");
    assert_eq!(artifact.len(), 30);
    assert_eq!(
        artifact.feature_names(),
        ["minutes", "complexity_score", "ingredient_count"]
    );
    for record in artifact.records() {
        assert!(record.cluster < 3);
        assert_eq!(artifact.locate(&record.features()), record.cluster);
    }
}

#[test]
fn test_fit_preserves_corpus_order() {
    let corpus = sample_corpus();
    let artifact = ModelArtifact::fit(corpus.clone(), &config(3)).expect("fit");
    for (record, recipe) in artifact.records().iter().zip(&corpus) {
        assert_eq!(&record.recipe, recipe);
    }
}

#[test]
fn test_fit_rejects_empty_corpus() {
    assert!(matches!(
        ModelArtifact::fit(Vec::new(), &config(2)),
        Err(Error::EmptyCorpus)
    ));
}

#[test]
fn test_fit_rejects_too_many_clusters() {
    let corpus: Vec<Recipe> = sample_corpus().into_iter().take(4).collect();
    let err = ModelArtifact::fit(corpus, &config(6)).unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains('6'));
}

#[test]
fn test_fit_rejects_non_finite_feature() {
    let mut corpus = sample_corpus();
    corpus[4].minutes = f64::NAN;
    assert!(matches!(
        ModelArtifact::fit(corpus, &config(3)),
        Err(Error::MissingFeature {
            row: 4,
            feature: "minutes"
        })
    ));
}

#[test]
fn test_fit_rejects_negative_minutes() {
    let mut corpus = sample_corpus();
    corpus[7].minutes = -40.0;
    let err = ModelArtifact::fit(corpus, &config(3)).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingFeature {
            row: 7,
            feature: "minutes"
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Data);
}

#[test]
fn test_fit_rejects_duplicate_ids() {
    let mut corpus = sample_corpus();
    corpus[1].id = RecipeId::Int(0);
    let err = ModelArtifact::fit(corpus, &config(3)).unwrap_err();
    match &err {
        Error::DuplicateId { row, id } => {
            assert_eq!(*row, 1);
            assert_eq!(id, "0");
        }
        other => panic!("expected DuplicateId, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Data);
}

// -------------------------------------------------------------------------
// Querying
// -------------------------------------------------------------------------

#[test]
fn test_recommend_stays_in_matched_cluster() {
    let artifact = ModelArtifact::fit(sample_corpus(), &config(3)).expect("fit");
    let p = prefs(12.0, 2.0, 2.0, 5);
    let cluster = artifact.locate(&p.features());
    let recs = artifact.recommend(&p);

    assert_eq!(recs.len(), 5);
    for rec in &recs {
        assert_eq!(artifact.records()[rec.row].cluster, cluster);
        assert!(rec.name.starts_with("Quick Pasta"));
    }
    assert!(recs
        .windows(2)
        .all(|w| w[0].similarity_distance <= w[1].similarity_distance));
}

#[test]
fn test_recommend_returns_whole_small_cluster() {
    let artifact = ModelArtifact::fit(sample_corpus(), &config(3)).expect("fit");
    let p = prefs(12.0, 2.0, 2.0, 1000);
    let cluster = artifact.locate(&p.features());
    let members = artifact
        .records()
        .iter()
        .filter(|r| r.cluster == cluster)
        .count();
    assert_eq!(artifact.recommend(&p).len(), members);
}

#[test]
fn test_find_resolution_order() {
    let mut corpus = sample_corpus();
    corpus[0] = corpus[0].clone().with_food_recipe_id(7);
    corpus[2].id = RecipeId::Text("roast-2".into());
    let artifact = ModelArtifact::fit(corpus, &config(3)).expect("fit");

    // food_recipe_id wins over the recipe whose id is 7.
    assert_eq!(artifact.find("7").map(|(row, _)| row), Some(0));
    assert_eq!(artifact.find("roast-2").map(|(row, _)| row), Some(2));
    assert_eq!(artifact.find("12").map(|(row, _)| row), Some(12));
    assert!(artifact.find("999").is_none());
    assert!(artifact.find("nope").is_none());
}

#[test]
fn test_summary_maps_centroids_to_raw_units() {
    let artifact = ModelArtifact::fit(sample_corpus(), &config(3)).expect("fit");
    let summary = artifact.summary();
    assert_eq!(summary.n_records, 30);
    assert_eq!(summary.cluster_sizes.iter().sum::<usize>(), 30);
    assert_eq!(summary.centroids.len(), 3);
    assert_eq!(summary.seed, 42);

    let mut minutes: Vec<f64> = summary.centroids.iter().map(|c| c[0]).collect();
    minutes.sort_by(f64::total_cmp);
    assert!(minutes[0] < 30.0);
    assert!(minutes[2] > 100.0);
}

// -------------------------------------------------------------------------
// Persistence
// -------------------------------------------------------------------------

#[test]
fn test_bytes_round_trip() {
    let artifact = ModelArtifact::fit(sample_corpus(), &config(3)).expect("fit");
    let bytes = artifact.to_bytes().expect("encode");
    assert_eq!(&bytes[0..4], ARTIFACT_MAGIC);
    assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), ARTIFACT_VERSION);

    let restored = ModelArtifact::from_bytes(&bytes).expect("decode");
    assert_eq!(restored, artifact);

    let p = prefs(45.0, 20.0, 5.0, 4);
    assert_eq!(restored.recommend(&p), artifact.recommend(&p));
    assert_eq!(
        restored.search("stew", 5).expect("search"),
        artifact.search("stew", 5).expect("search")
    );
}

#[test]
fn test_from_bytes_rejects_bad_header() {
    assert!(matches!(
        ModelArtifact::from_bytes(b"RC"),
        Err(Error::Serialization(_))
    ));
    assert!(matches!(
        ModelArtifact::from_bytes(b"XXXX\x01\x00rest"),
        Err(Error::Serialization(_))
    ));
    assert!(matches!(
        ModelArtifact::from_bytes(b"RCPM\x09\x00rest"),
        Err(Error::IncompatibleArtifact {
            found: 9,
            expected: ARTIFACT_VERSION
        })
    ));
}

#[test]
fn test_from_bytes_rejects_truncated_payload() {
    let artifact = ModelArtifact::fit(sample_corpus(), &config(3)).expect("fit");
    let bytes = artifact.to_bytes().expect("encode");
    let truncated = &bytes[..bytes.len() / 2];
    assert!(matches!(
        ModelArtifact::from_bytes(truncated),
        Err(Error::Serialization(_))
    ));
}

#[test]
fn test_save_and_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("model.rcpm");
    let artifact = ModelArtifact::fit(sample_corpus(), &config(3)).expect("fit");

    artifact.save(&path).expect("save");
    assert!(!temp_dir.path().join("model.rcpm.tmp").exists());

    let loaded = ModelArtifact::load(&path).expect("load");
    assert_eq!(loaded, artifact);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    assert!(matches!(
        ModelArtifact::load(&temp_dir.path().join("absent.rcpm")),
        Err(Error::Io(_))
    ));
}
