// Spent Filter Tests
// Tests for the Bloom filter of consumed outputs

use utxomesh::ledger::{OutputId, SpentFilter, DEFAULT_FILTER_CAPACITY};

#[test]
fn test_default_sizing() {
    let filter = SpentFilter::default();

    assert_eq!(filter.capacity(), DEFAULT_FILTER_CAPACITY);
    assert_eq!(filter.num_hashes(), 10);
    assert!(filter.num_bits() >= 143_776);
    assert!(filter.num_bits().is_power_of_two());
    assert!(filter.is_empty());
}

#[test]
fn test_no_false_negatives() {
    let mut filter = SpentFilter::new(1_000, 0.01);
    let ids: Vec<OutputId> = (0..1_000).map(|i| OutputId::new(format!("tx{i}"), i % 3)).collect();

    for id in &ids {
        filter.insert(id);
    }

    assert!(ids.iter().all(|id| filter.contains(id)));
    assert_eq!(filter.len(), 1_000);
    assert!(!filter.is_saturated());
}

#[test]
fn test_false_positive_rate_near_target() {
    let mut filter = SpentFilter::new(2_000, 0.01);
    for i in 0..2_000 {
        filter.insert(&OutputId::new(format!("in{i}"), 0));
    }

    let samples = 20_000;
    let hits = (0..samples)
        .filter(|i| filter.contains(&OutputId::new(format!("out{i}"), 0)))
        .count();

    // Target 1%; allow generous slack for hash variance.
    assert!((hits as f64 / samples as f64) < 0.03, "fp rate too high: {hits}/{samples}");
}

#[test]
fn test_index_distinguishes_ids() {
    let mut filter = SpentFilter::default();
    filter.insert(&OutputId::new("abc", 0));

    assert!(filter.contains(&OutputId::new("abc", 0)));
    assert!(!filter.contains(&OutputId::new("abc", 1)));
}

#[test]
fn test_saturation_reported_past_capacity() {
    let mut filter = SpentFilter::new(2, 0.1);
    for i in 0..3 {
        filter.insert(&OutputId::new("t", i));
    }
    assert!(filter.is_saturated());
}

#[test]
fn test_degenerate_arguments_clamped() {
    let filter = SpentFilter::new(0, 2.0);

    assert_eq!(filter.capacity(), 1);
    assert!(filter.num_bits() >= 64);
    assert!(filter.num_hashes() >= 1);
}
