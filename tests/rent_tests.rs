use std::sync::Arc;

use unitrie::{
    InMemoryTrieStore, NodeVersion, RentTracker, Trie, TrieNodeData, TrieStore, RENT_EPOCH_ANCHOR,
};

#[test]
fn plain_puts_carry_no_rent_stamp() {
    let trie = Trie::new_temp()
        .put(b"foo", b"abc")
        .unwrap()
        .put(b"foot", b"abc")
        .unwrap();

    let nodes = trie.get_nodes(b"foo").unwrap().unwrap();
    assert_eq!(nodes[0].value().unwrap(), Some(b"abc".to_vec()));
    assert_eq!(trie.last_rent_paid_time(), None);
    assert_eq!(trie.version(), NodeVersion::V1);
}

#[test]
fn versions_and_stamps_along_a_mixed_chain() {
    let trie = Trie::new_temp()
        .put(b"foo", b"leaf")
        .unwrap()
        .put_with_rent(b"fo", b"1stepUp", Some(2020))
        .unwrap()
        .put(b"f", b"2stepsUp")
        .unwrap()
        .put_with_rent(b"bar", b"createsplit", Some(2021))
        .unwrap();

    let nodes = trie.get_nodes(b"foo").unwrap().unwrap();
    assert_eq!(nodes.len(), 4);

    let versions: Vec<u8> = nodes.iter().map(|node| node.version().number()).collect();
    assert_eq!(versions, vec![1, 2, 1, 2]);

    let stamps: Vec<Option<i64>> = nodes
        .iter()
        .map(|node| node.last_rent_paid_time())
        .collect();
    // the split that "bar" caused stamps the new internal root with the
    // put's own timestamp
    assert_eq!(stamps, vec![None, Some(2020), None, Some(2021)]);
}

#[test]
fn rent_update_with_same_value_changes_the_hash() {
    let first = Trie::new_temp()
        .put_with_rent(b"foo", b"bar", Some(1000))
        .unwrap();
    let second = first.put_with_rent(b"foo", b"bar", Some(2000)).unwrap();

    assert_eq!(second.get(b"foo").unwrap(), Some(b"bar".to_vec()));
    assert_eq!(second.last_rent_paid_time(), Some(2000));
    assert_ne!(first.hash().unwrap(), second.hash().unwrap());
}

#[test]
fn rentless_writes_do_not_demote_stamped_nodes() {
    let stamped = Trie::new_temp()
        .put_with_rent(b"foo", b"bar", Some(1000))
        .unwrap();

    // same value, no timestamp: the stamped node survives untouched
    let unchanged = stamped.put(b"foo", b"bar").unwrap();
    assert!(stamped.ptr_eq(&unchanged));
    assert_eq!(unchanged.last_rent_paid_time(), Some(1000));
    assert_eq!(unchanged.version(), NodeVersion::V2);

    // a different value does restamp with the write's own version
    let rewritten = stamped.put(b"foo", b"bar2").unwrap();
    assert_eq!(rewritten.last_rent_paid_time(), None);
    assert_eq!(rewritten.version(), NodeVersion::V1);
}

#[test]
fn identical_rent_updates_return_the_receiver() {
    let trie = Trie::new_temp()
        .put_with_rent(b"foo", b"bar", Some(1000))
        .unwrap();
    let again = trie.put_with_rent(b"foo", b"bar", Some(1000)).unwrap();
    assert!(trie.ptr_eq(&again));
}

#[test]
fn minus_one_timestamps_are_the_unset_sentinel() {
    let trie = Trie::new_temp()
        .put_with_rent(b"foo", b"bar", Some(-1))
        .unwrap();
    assert_eq!(trie.version(), NodeVersion::V1);
    assert_eq!(trie.last_rent_paid_time(), None);
}

#[test]
fn rent_stamps_survive_the_store() {
    let store = Arc::new(InMemoryTrieStore::new());
    let trie = Trie::new(store.clone())
        .put_with_rent(b"foo", b"bar", Some(123_456_789))
        .unwrap();
    trie.save(store.as_ref()).unwrap();

    let root_bytes = store.retrieve_node(trie.hash().unwrap()).unwrap().unwrap();
    let dyn_store: Arc<dyn TrieStore> = store.clone();
    let reloaded = Trie::from_message(&root_bytes, Some(dyn_store)).unwrap();

    assert_eq!(reloaded.version(), NodeVersion::V2);
    assert_eq!(reloaded.last_rent_paid_time(), Some(123_456_789));
    assert_eq!(reloaded.hash().unwrap(), trie.hash().unwrap());
}

#[test]
fn node_data_projection() {
    let plain = Trie::new_temp().put(b"foo", b"bar").unwrap();
    assert!(TrieNodeData::is_new(&plain));

    let stamped = plain
        .put_with_rent(b"foo", b"zip", Some(RENT_EPOCH_ANCHOR))
        .unwrap();
    assert!(!TrieNodeData::is_new(&stamped));
    assert_eq!(TrieNodeData::value_length(&stamped), 3);
    assert_eq!(
        TrieNodeData::last_rent_paid_time(&stamped),
        Some(RENT_EPOCH_ANCHOR)
    );
}

#[test]
fn tracker_consumes_trie_nodes() {
    let year = 365 * 24 * 3600;
    let stamped = Trie::new_temp()
        .put_with_rent(b"foo", &[0u8; 1000], Some(RENT_EPOCH_ANCHOR))
        .unwrap();

    let mut tracker = RentTracker::new(RENT_EPOCH_ANCHOR + 3 * year);
    tracker.track_read(Some(&stamped as &dyn TrieNodeData));
    // (1000 + 128) * 3 years / 2^21 is around 50k units
    assert!(tracker.rent_due() > 10_000);

    let mut tracker = RentTracker::new(RENT_EPOCH_ANCHOR + 3 * year);
    let fresh = Trie::new_temp().put(b"foo", &[0u8; 1000]).unwrap();
    tracker.track_read(Some(&fresh as &dyn TrieNodeData));
    assert_eq!(tracker.rent_due(), 0, "unstamped nodes are never charged");

    let mut tracker = RentTracker::new(RENT_EPOCH_ANCHOR + 3 * year);
    tracker.track_rewrite(&stamped, 500);
    assert!(tracker.rent_due() > 1_000);
}
