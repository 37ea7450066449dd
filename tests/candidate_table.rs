use enpakk::{block_hash, CandidateTable, FlatCandidateTable, MAX_CANDIDATES};

fn check_table(cap: usize) {
    let table = CandidateTable::with_cap(cap);
    for h in 0..=u8::MAX {
        let bucket = table.bucket(h);
        assert!(bucket.iter().all(|b| block_hash(b) == h), "bucket {h}");
        assert_eq!(bucket.len(), table.true_size(h).min(cap));
        // enumeration order: b1 outer, b2 inner, both ascending
        assert!(bucket.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn buckets_complete_up_to_cap() {
    check_table(MAX_CANDIDATES);
    check_table(100);
    check_table(1);
}

#[test]
fn every_hash_has_256_preimages() {
    let table = CandidateTable::build();
    for h in 0..=u8::MAX {
        assert_eq!(table.true_size(h), 256);
        assert_eq!(table.count(h), 256);
    }
}

#[test]
fn build_is_deterministic() {
    assert_eq!(CandidateTable::build(), CandidateTable::build());
}

#[test]
fn flat_form_matches_buckets() {
    let table = CandidateTable::with_cap(10);
    let flat = FlatCandidateTable::from_table(&table);
    for h in 0..=u8::MAX {
        let base = h as usize * flat.stride() * 2;
        let stored = &flat.blocks()[base..base + table.count(h) * 2];
        let expected: Vec<u8> = table.bucket(h).iter().flatten().copied().collect();
        assert_eq!(stored, &expected[..]);
        assert_eq!(flat.counts()[h as usize] as usize, table.count(h));
    }
}
