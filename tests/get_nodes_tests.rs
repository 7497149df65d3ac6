use unitrie::Trie;

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

#[test]
fn unknown_keys_have_no_path() {
    let trie = Trie::new_temp();
    assert!(trie.get_nodes(&[0x01, 0x02, 0x03]).unwrap().is_none());
    assert!(trie.get_nodes(b"foo").unwrap().is_none());

    let trie = trie.put(b"foo", b"bar").unwrap();
    assert!(trie.get_nodes(b"fob").unwrap().is_none());
    assert!(trie.get_nodes(b"fooo").unwrap().is_none());
}

#[test]
fn one_key_yields_one_node() {
    let trie = Trie::new_temp().put(b"foo", b"bar").unwrap();
    let nodes = trie.get_nodes(b"foo").unwrap().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].value().unwrap(), Some(b"bar".to_vec()));
}

#[test]
fn two_keys_yield_leaf_then_root() {
    let trie = Trie::new_temp()
        .put(b"foo", b"bar")
        .unwrap()
        .put(b"bar", b"foo")
        .unwrap();

    let nodes = trie.get_nodes(b"foo").unwrap().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].value().unwrap(), Some(b"bar".to_vec()));
    assert_eq!(nodes[1].value().unwrap(), None);
    assert!(nodes[1].ptr_eq(&trie));
}

#[test]
fn nested_keys_walk_up_the_chain() {
    let trie = Trie::new_temp()
        .put(b"f", b"1")
        .unwrap()
        .put(b"fo", b"2")
        .unwrap()
        .put(b"foo", b"3")
        .unwrap();

    let nodes = trie.get_nodes(b"foo").unwrap().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].value().unwrap(), Some(b"3".to_vec()));
    assert_eq!(nodes[1].value().unwrap(), Some(b"2".to_vec()));
    assert_eq!(nodes[2].value().unwrap(), Some(b"1".to_vec()));
}

#[test]
fn each_element_commits_to_its_predecessor() {
    let trie = Trie::new_temp()
        .put(b"f", b"A")
        .unwrap()
        .put(b"foo", b"B")
        .unwrap()
        .put(b"fad", b"C")
        .unwrap();

    let nodes = trie.get_nodes(b"foo").unwrap().unwrap();
    assert!(nodes.len() >= 2);
    assert_eq!(nodes[0].value().unwrap(), Some(b"B".to_vec()));
    assert!(nodes.last().unwrap().ptr_eq(&trie));

    for pair in nodes.windows(2) {
        let child = &pair[0];
        let parent = &pair[1];
        let parent_message = parent.to_message().unwrap();
        let committed = contains(&parent_message, child.hash().unwrap().as_bytes())
            || contains(&parent_message, &child.to_message().unwrap());
        assert!(
            committed,
            "parent encoding must contain the child's hash or embedded bytes"
        );
    }
}

#[test]
fn get_nodes_agrees_with_find() {
    let trie = Trie::new_temp()
        .put(b"foo", b"1")
        .unwrap()
        .put(b"fad", b"2")
        .unwrap();
    let nodes = trie.get_nodes(b"fad").unwrap().unwrap();
    let found = trie.find(b"fad").unwrap().unwrap();
    assert!(nodes[0].ptr_eq(&found));
}
