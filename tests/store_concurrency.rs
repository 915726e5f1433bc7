// tests/store_concurrency.rs
//
// Interleaved appends and snapshots from several OS threads. Every snapshot
// must stay within [0, C], contain only whole records, and keep each writer's
// records in the order that writer appended them.

use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

use news_service::{ArticleRecord, NewsStore};
use proptest::prelude::*;

// All three fields carry the same tag so a torn record is detectable.
fn tagged(writer: usize, seq: usize) -> ArticleRecord {
    let tag = format!("w{writer}-{seq}");
    ArticleRecord::new(tag.clone(), tag.clone(), tag)
}

fn parse_tag(tag: &str) -> (usize, usize) {
    let (w, s) = tag
        .trim_start_matches('w')
        .split_once('-')
        .expect("tag shape");
    (w.parse().expect("writer id"), s.parse().expect("seq"))
}

fn check_snapshot(snap: &[ArticleRecord], cap: usize) -> Result<(), String> {
    if snap.len() > cap {
        return Err(format!("snapshot len {} exceeds capacity {cap}", snap.len()));
    }
    let mut last_seq: HashMap<usize, usize> = HashMap::new();
    for r in snap {
        if r.title != r.description || r.title != r.source {
            return Err(format!("torn record: {r:?}"));
        }
        let (w, s) = parse_tag(&r.title);
        if let Some(prev) = last_seq.insert(w, s) {
            if prev >= s {
                return Err(format!("writer {w} out of order: {prev} before {s}"));
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn concurrent_appends_and_snapshots_stay_consistent(
        cap in 1usize..16,
        appends in prop::collection::vec(0usize..150, 1..4),
        reads in 1usize..200,
    ) {
        let store = Arc::new(NewsStore::with_capacity(cap).unwrap());
        let barrier = Arc::new(Barrier::new(appends.len() + 2));

        let writers: Vec<_> = appends
            .iter()
            .copied()
            .enumerate()
            .map(|(w, n)| {
                let store = store.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for s in 0..n {
                        store.append(tagged(w, s));
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let mut errors = Vec::new();
                    for _ in 0..reads {
                        if let Err(e) = check_snapshot(&store.snapshot(), cap) {
                            errors.push(e);
                        }
                    }
                    errors
                })
            })
            .collect();

        for w in writers {
            w.join().expect("writer thread");
        }
        for r in readers {
            let errors = r.join().expect("reader thread");
            prop_assert!(errors.is_empty(), "inconsistent snapshots: {:?}", errors);
        }

        let total: usize = appends.iter().sum();
        let final_snap = store.snapshot();
        prop_assert_eq!(final_snap.len(), total.min(cap));
        prop_assert!(check_snapshot(&final_snap, cap).is_ok());
    }
}
