//! Property-based tests for list decoding, validation, clustering and
//! ranking.

use proptest::{
    collection::vec,
    prelude::{any, prop_assert, prop_assert_eq, Strategy},
    proptest,
    test_runner::{Config as ProptestConfig, FileFailurePersistence},
};
use recipe_core::cluster::ClusterIndex;
use recipe_core::config::ModelConfig;
use recipe_core::list_field::parse_list_field;
use recipe_core::ranker::rank;
use recipe_core::recipe::FeatureVector;
use recipe_core::validation::validate_numeric_range;
use recipe_core::{Recipe, RecipeRecord};

const PROP_CASES: u32 = 64;

fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: PROP_CASES,
        failure_persistence: Some(Box::new(FileFailurePersistence::WithSource(
            "recipe-property-regressions",
        ))),
        ..ProptestConfig::default()
    }
}

fn point_strategy() -> impl Strategy<Value = FeatureVector> {
    (0.0_f64..300.0, 0.0_f64..100.0, 1.0_f64..50.0).prop_map(|(a, b, c)| [a, b, c])
}

fn points_and_k() -> impl Strategy<Value = (Vec<FeatureVector>, usize)> {
    vec(point_strategy(), 6..40).prop_flat_map(|points| {
        let max_k = points.len().min(6);
        (proptest::strategy::Just(points), 2..=max_k)
    })
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn list_parsing_never_yields_blank_items(raw in any::<String>()) {
        let items = parse_list_field(Some(&raw));
        prop_assert!(items.iter().all(|item| !item.trim().is_empty()));
    }

    #[test]
    fn json_lists_decode_exactly(items in vec("[a-z][a-z ]{0,10}[a-z]", 0..8)) {
        let encoded = serde_json::to_string(&items).expect("encode");
        prop_assert_eq!(parse_list_field(Some(&encoded)), items);
    }

    #[test]
    fn in_range_values_are_returned_unchanged(value in 0.0_f64..=300.0) {
        let checked = validate_numeric_range(value, 0.0, 300.0, "desired cooking time");
        prop_assert_eq!(checked.ok(), Some(value));
    }

    #[test]
    fn out_of_range_values_are_rejected(value in prop_oneof_out_of_range()) {
        prop_assert!(validate_numeric_range(value, 0.0, 300.0, "desired cooking time").is_err());
    }

    #[test]
    fn fitted_labels_match_nearest_centroid((points, k) in points_and_k()) {
        let config = ModelConfig { n_clusters: k, ..ModelConfig::default() };
        let fit = ClusterIndex::fit(&points, &config).expect("fit");
        prop_assert_eq!(fit.labels.len(), points.len());
        for (point, label) in points.iter().zip(&fit.labels) {
            prop_assert_eq!(fit.index.locate(point), *label);
        }
    }

    #[test]
    fn ranking_is_sorted_and_capped(
        minutes in vec(0.0_f64..300.0, 1..30),
        n in 1_usize..40,
        query in point_strategy(),
    ) {
        let records: Vec<RecipeRecord> = minutes
            .iter()
            .enumerate()
            .map(|(i, m)| RecipeRecord {
                recipe: Recipe::new(i, format!("r{i}"), *m, "a,b,c", "x,y"),
                cluster: i % 2,
            })
            .collect();
        let members = records.iter().filter(|r| r.cluster == 0).count();
        let out = rank(&records, 0, &query, n);

        prop_assert_eq!(out.len(), n.min(members));
        prop_assert!(out.windows(2).all(|w| w[0].similarity_distance <= w[1].similarity_distance));
        prop_assert!(out.iter().all(|r| records[r.row].cluster == 0));
    }
}

fn prop_oneof_out_of_range() -> impl Strategy<Value = f64> {
    proptest::prop_oneof![-1.0e6_f64..-1.0e-9, 300.000_001_f64..1.0e6]
}
