use codec::{Reader, Writer};

use super::*;

#[test]
fn primary_directory_tracks_insert_remove() {
    let mut dir = PrimaryDirectory::new();
    let loc = RecordLocation::new(alloc::Slot::new(0, 16), 42);
    assert!(dir.insert(PrimaryKey::I32(1), loc).is_none());
    assert_eq!(dir.get(&PrimaryKey::I32(1)), Some(&loc));
    assert_eq!(dir.len(), 1);

    let removed = dir.remove(&PrimaryKey::I32(1));
    assert_eq!(removed, Some(loc));
    assert!(dir.is_empty());
}

#[test]
fn primary_directory_iterates_in_ascending_key_order() {
    let mut dir = PrimaryDirectory::new();
    for n in [5, 1, 3, 2, 4] {
        dir.insert(PrimaryKey::I32(n), RecordLocation::new(alloc::Slot::new(n as u64, 1), 0));
    }
    let keys: Vec<_> = dir.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(
        keys,
        vec![
            PrimaryKey::I32(1),
            PrimaryKey::I32(2),
            PrimaryKey::I32(3),
            PrimaryKey::I32(4),
            PrimaryKey::I32(5),
        ]
    );
}

#[test]
fn secondary_index_ordinal_is_case_sensitive() {
    let mut idx = SecondaryIndex::new(Comparator::Ordinal);
    idx.insert(IndexValue::Str("Smith".into()), PrimaryKey::I32(1));
    idx.insert(IndexValue::Str("smith".into()), PrimaryKey::I32(2));

    assert_eq!(idx.lookup(&IndexValue::Str("Smith".into())), vec![PrimaryKey::I32(1)]);
    assert_eq!(idx.lookup(&IndexValue::Str("smith".into())), vec![PrimaryKey::I32(2)]);
}

#[test]
fn secondary_index_ignore_case_folds_together() {
    let mut idx = SecondaryIndex::new(Comparator::OrdinalIgnoreCase);
    idx.insert(IndexValue::Str("Smith".into()), PrimaryKey::I32(1));
    idx.insert(IndexValue::Str("smith".into()), PrimaryKey::I32(2));

    let mut hits = idx.lookup(&IndexValue::Str("SMITH".into()));
    hits.sort();
    assert_eq!(hits, vec![PrimaryKey::I32(1), PrimaryKey::I32(2)]);
}

#[test]
fn secondary_index_remove_drops_empty_bucket() {
    let mut idx = SecondaryIndex::new(Comparator::Ordinal);
    idx.insert(IndexValue::I32(7), PrimaryKey::I32(1));
    idx.remove(&IndexValue::I32(7), &PrimaryKey::I32(1));
    assert!(idx.is_empty());
}

#[test]
fn secondary_index_range_is_inclusive_and_ordered() {
    let mut idx = SecondaryIndex::new(Comparator::Ordinal);
    for n in [10, 20, 30, 40] {
        idx.insert(IndexValue::I32(n), PrimaryKey::I32(n));
    }
    let hits = idx.range(&IndexValue::I32(15), &IndexValue::I32(35));
    assert_eq!(hits, vec![PrimaryKey::I32(20), PrimaryKey::I32(30)]);
}

#[test]
fn secondary_index_range_bounded_with_reversed_or_empty_bounds_is_empty_not_a_panic() {
    use std::ops::Bound;

    let mut idx = SecondaryIndex::new(Comparator::Ordinal);
    for n in [10, 20, 30, 40] {
        idx.insert(IndexValue::I32(n), PrimaryKey::I32(n));
    }

    // lower strictly greater than upper: greater_than(50, true).less_than(10, true)
    assert!(idx
        .range_bounded(Bound::Included(&IndexValue::I32(50)), Bound::Included(&IndexValue::I32(10)))
        .is_empty());

    // same point excluded on both sides: greater_than(20, false).less_than(20, false)
    assert!(idx
        .range_bounded(Bound::Excluded(&IndexValue::I32(20)), Bound::Excluded(&IndexValue::I32(20)))
        .is_empty());

    // same point, one side excluded: also an empty intersection
    assert!(idx
        .range_bounded(Bound::Excluded(&IndexValue::I32(20)), Bound::Included(&IndexValue::I32(20)))
        .is_empty());
    assert!(idx
        .range_bounded(Bound::Included(&IndexValue::I32(20)), Bound::Excluded(&IndexValue::I32(20)))
        .is_empty());

    // same point, both inclusive: a legitimate single-value match
    assert_eq!(
        idx.range_bounded(Bound::Included(&IndexValue::I32(20)), Bound::Included(&IndexValue::I32(20))),
        vec![PrimaryKey::I32(20)]
    );
}

#[test]
fn primary_directory_round_trips_through_blob() {
    let mut dir = PrimaryDirectory::new();
    dir.insert(PrimaryKey::Str("alpha".into()), RecordLocation::new(alloc::Slot::new(0, 10), 111));
    dir.insert(PrimaryKey::Bytes(vec![1, 2, 3]), RecordLocation::new(alloc::Slot::new(10, 20), 222));

    let mut buf = Vec::new();
    write_primary(&mut Writer::new(&mut buf), &dir).unwrap();

    let restored = read_primary(&mut Reader::new(&buf[..])).unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(
        restored.get(&PrimaryKey::Str("alpha".into())).unwrap().fingerprint,
        111
    );
    assert_eq!(
        restored.get(&PrimaryKey::Bytes(vec![1, 2, 3])).unwrap().slot,
        alloc::Slot::new(10, 20)
    );
}

#[test]
fn primary_directory_writes_slot_length_as_u32_per_the_on_disk_layout() {
    let mut dir = PrimaryDirectory::new();
    dir.insert(PrimaryKey::I32(1), RecordLocation::new(alloc::Slot::new(0, 10), 0));

    let mut buf = Vec::new();
    write_primary(&mut Writer::new(&mut buf), &dir).unwrap();

    // entry count (4) + tag (1) + key (4) + offset (8) + length (4) + fingerprint (4)
    assert_eq!(buf.len(), 4 + 1 + 4 + 8 + 4 + 4);

    let restored = read_primary(&mut Reader::new(&buf[..])).unwrap();
    assert_eq!(restored.get(&PrimaryKey::I32(1)).unwrap().slot, alloc::Slot::new(0, 10));
}

#[test]
fn secondary_index_round_trips_through_blob_preserving_comparator() {
    let mut idx = SecondaryIndex::new(Comparator::OrdinalIgnoreCase);
    idx.insert(IndexValue::Str("Smith".into()), PrimaryKey::I32(1));
    idx.insert(IndexValue::Null, PrimaryKey::I32(2));

    let mut buf = Vec::new();
    write_secondary(&mut Writer::new(&mut buf), "surname", &idx).unwrap();

    let (name, restored) = read_secondary(&mut Reader::new(&buf[..])).unwrap();
    assert_eq!(name, "surname");
    assert_eq!(restored.comparator(), Comparator::OrdinalIgnoreCase);
    assert_eq!(restored.lookup(&IndexValue::Str("SMITH".into())), vec![PrimaryKey::I32(1)]);
    assert_eq!(restored.lookup(&IndexValue::Null), vec![PrimaryKey::I32(2)]);
}
