use crate::error::TrieError;
use crate::key_slice::KeySlice;
use crate::trie::Trie;

/// A node paired with the full key that reaches it from the root.
#[derive(Clone, Debug)]
pub struct IterationElement {
    node_key: KeySlice,
    node: Trie,
}

impl IterationElement {
    fn new(node_key: KeySlice, node: Trie) -> Self {
        IterationElement { node_key, node }
    }

    pub fn node(&self) -> &Trie {
        &self.node
    }

    pub fn node_key(&self) -> &KeySlice {
        &self.node_key
    }
}

fn root_element(root: &Trie) -> IterationElement {
    IterationElement::new(root.shared_path().clone(), root.clone())
}

fn child_element(parent: &IterationElement, bit: u8, child: Trie) -> IterationElement {
    let key = parent.node_key.rebuild_shared_path(bit, child.shared_path());
    IterationElement::new(key, child)
}

/// Yields the leftmost unvisited node first. Hash-only children are
/// resolved through the store on demand, so items are fallible; after an
/// error the iterator is exhausted.
pub struct InOrderIterator {
    visiting: Vec<IterationElement>,
    primed: bool,
    done: bool,
}

impl InOrderIterator {
    pub(crate) fn new(root: &Trie) -> Self {
        InOrderIterator {
            visiting: vec![root_element(root)],
            primed: false,
            done: false,
        }
    }

    /// Pushes the chain of left children below the element on top of the
    /// stack, leaving the leftmost unvisited node on top.
    fn push_leftmost(&mut self) -> Result<(), TrieError> {
        while let Some(top) = self.visiting.last() {
            let Some(left) = top.node.retrieve_node(0)? else {
                break;
            };
            let element = child_element(top, 0, left);
            self.visiting.push(element);
        }
        Ok(())
    }
}

impl Iterator for InOrderIterator {
    type Item = Result<IterationElement, TrieError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.primed {
            self.primed = true;
            if let Err(err) = self.push_leftmost() {
                self.done = true;
                return Some(Err(err));
            }
        }

        let element = self.visiting.pop()?;
        // if the node has a right child, its leftmost descendant is next
        match element.node.retrieve_node(1) {
            Ok(Some(right)) => {
                let right_element = child_element(&element, 1, right);
                self.visiting.push(right_element);
                if let Err(err) = self.push_leftmost() {
                    self.done = true;
                    return Some(Err(err));
                }
            }
            Ok(None) => {}
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        }
        Some(Ok(element))
    }
}

/// Yields each node before either of its subtrees.
pub struct PreOrderIterator {
    visiting: Vec<IterationElement>,
    done: bool,
}

impl PreOrderIterator {
    pub(crate) fn new(root: &Trie) -> Self {
        PreOrderIterator {
            visiting: vec![root_element(root)],
            done: false,
        }
    }
}

impl Iterator for PreOrderIterator {
    type Item = Result<IterationElement, TrieError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let element = self.visiting.pop()?;

        // the stack is LIFO, so push the right subtree first
        for bit in [1u8, 0] {
            match element.node.retrieve_node(bit) {
                Ok(Some(child)) => {
                    let child_element = child_element(&element, bit, child);
                    self.visiting.push(child_element);
                }
                Ok(None) => {}
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        Some(Ok(element))
    }
}

/// Yields each node after both of its subtrees.
pub struct PostOrderIterator {
    visiting: Vec<IterationElement>,
    visiting_right_child: Vec<bool>,
    primed: bool,
    done: bool,
}

impl PostOrderIterator {
    pub(crate) fn new(root: &Trie) -> Self {
        PostOrderIterator {
            visiting: vec![root_element(root)],
            visiting_right_child: vec![false],
            primed: false,
            done: false,
        }
    }

    fn push_leftmost(&mut self) -> Result<(), TrieError> {
        while let Some(top) = self.visiting.last() {
            let Some(left) = top.node.retrieve_node(0)? else {
                break;
            };
            let element = child_element(top, 0, left);
            self.visiting.push(element);
            self.visiting_right_child.push(false);
        }
        Ok(())
    }
}

impl Iterator for PostOrderIterator {
    type Item = Result<IterationElement, TrieError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.primed {
            self.primed = true;
            if let Err(err) = self.push_leftmost() {
                self.done = true;
                return Some(Err(err));
            }
        }

        loop {
            let element = self.visiting.last()?.clone();
            let right = match element.node.retrieve_node(1) {
                Ok(right) => right,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };
            let right_visited = *self.visiting_right_child.last()?;

            match right {
                None => {}
                Some(_) if right_visited => {}
                Some(right) => {
                    // descend into the right subtree before yielding this node
                    *self.visiting_right_child.last_mut()? = true;
                    let right_element = child_element(&element, 1, right);
                    self.visiting.push(right_element);
                    self.visiting_right_child.push(false);
                    if let Err(err) = self.push_leftmost() {
                        self.done = true;
                        return Some(Err(err));
                    }
                    continue;
                }
            }

            self.visiting.pop();
            self.visiting_right_child.pop();
            return Some(Ok(element));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trie() -> Trie {
        let mut trie = Trie::new_temp();
        for (key, value) in [
            (&b"bar"[..], &b"1"[..]),
            (b"baz", b"2"),
            (b"foo", b"3"),
            (b"fop", b"4"),
        ] {
            trie = trie.put(key, value).unwrap();
        }
        trie
    }

    fn collect_values(
        iter: impl Iterator<Item = Result<IterationElement, TrieError>>,
    ) -> Vec<Vec<u8>> {
        iter.map(|element| element.unwrap())
            .filter_map(|element| element.node().value().unwrap())
            .collect()
    }

    #[test]
    fn in_order_yields_keys_in_bit_order() {
        let values = collect_values(sample_trie().in_order_iter());
        assert_eq!(values, vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec(), b"4".to_vec()]);
    }

    #[test]
    fn in_order_keys_resolve_their_nodes() {
        let trie = sample_trie();
        for element in trie.in_order_iter() {
            let element = element.unwrap();
            if element.node().value_length() > 0 {
                let key = element.node_key().encode();
                assert_eq!(
                    trie.get(&key).unwrap(),
                    element.node().value().unwrap(),
                    "full key must resolve back to the node's value"
                );
            }
        }
    }

    #[test]
    fn pre_order_parent_comes_first() {
        let trie = sample_trie();
        let elements: Vec<IterationElement> = trie
            .pre_order_iter()
            .map(|element| element.unwrap())
            .collect();
        // every node appears before both of its children
        for (index, element) in elements.iter().enumerate() {
            for bit in 0..2u8 {
                if let Some(child) = element.node().retrieve_node(bit).unwrap() {
                    let child_pos = elements
                        .iter()
                        .position(|other| other.node().ptr_eq(&child))
                        .unwrap();
                    assert!(child_pos > index);
                }
            }
        }
    }

    #[test]
    fn post_order_parent_comes_last() {
        let trie = sample_trie();
        let elements: Vec<IterationElement> = trie
            .post_order_iter()
            .map(|element| element.unwrap())
            .collect();
        for (index, element) in elements.iter().enumerate() {
            for bit in 0..2u8 {
                if let Some(child) = element.node().retrieve_node(bit).unwrap() {
                    let child_pos = elements
                        .iter()
                        .position(|other| other.node().ptr_eq(&child))
                        .unwrap();
                    assert!(child_pos < index);
                }
            }
        }
    }

    #[test]
    fn all_orders_visit_every_node() {
        let trie = sample_trie();
        let expected = trie.trie_size().unwrap();
        assert_eq!(trie.in_order_iter().count(), expected);
        assert_eq!(trie.pre_order_iter().count(), expected);
        assert_eq!(trie.post_order_iter().count(), expected);
    }
}
