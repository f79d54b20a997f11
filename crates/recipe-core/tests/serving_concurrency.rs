//! Concurrent reads against a service while retrains swap the artifact.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use recipe_core::config::RecommenderConfig;
use recipe_core::{Error, ModelState, Recipe, RecommenderService};

fn corpus(n: usize, offset: f64) -> Vec<Recipe> {
    (0..n)
        .map(|i| {
            let steps: Vec<String> = (0..=i % 6).map(|s| format!("step {s}")).collect();
            Recipe::new(
                i,
                format!("Dish {i}"),
                offset + (i % 10) as f64 * 12.0,
                vec!["rice", "egg", "scallion"],
                steps,
            )
        })
        .collect()
}

#[test]
fn test_readers_never_observe_a_missing_model_during_retrain() {
    let service = Arc::new(RecommenderService::new(RecommenderConfig::default()));
    service.retrain(corpus(60, 5.0)).expect("initial fit");

    let stop = Arc::new(AtomicBool::new(false));
    let start = Arc::new(Barrier::new(5));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            let stop = Arc::clone(&stop);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let mut reads = 0usize;
                loop {
                    let recs = service
                        .recommend(40.0, 10.0, 3.0, Some(5))
                        .expect("recommend during retrain");
                    assert!(recs.len() <= 5);
                    let hits = service.search("dish", Some(3)).expect("search");
                    assert_eq!(hits.len(), 3);
                    reads += 1;
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                }
                reads
            })
        })
        .collect();

    start.wait();
    for round in 0..5 {
        let offset = 5.0 + f64::from(round) * 3.0;
        service.retrain(corpus(60, offset)).expect("retrain");
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.join().expect("reader panicked") > 0);
    }
    assert_eq!(service.state(), ModelState::Fit);
}

#[test]
fn test_concurrent_retrains_are_rejected_not_queued() {
    let service = Arc::new(RecommenderService::new(RecommenderConfig::default()));
    let start = Arc::new(Barrier::new(4));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                service.retrain(corpus(2000, 0.0)).map(|_| ())
            })
        })
        .collect();

    let results: Vec<_> = workers
        .into_iter()
        .map(|w| w.join().expect("worker panicked"))
        .collect();

    assert!(results.iter().any(Result::is_ok));
    assert!(results
        .iter()
        .all(|r| matches!(r, Ok(()) | Err(Error::RetrainInProgress))));
    assert_eq!(service.state(), ModelState::Fit);
}
