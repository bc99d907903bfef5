use super::key::IndexKey;
use super::split::pick_split;
use crate::config::TreeConfig;
use crate::error::Result;
use crate::signature::Signature;
use log::debug;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Position of a signature record inside a [`SignatureTree`].
pub type RecordId = usize;

type NodeId = usize;

/// What an index entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRef {
    Record(RecordId),
    Node(NodeId),
}

/// A child reference paired with the key summarising it.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry {
    pub key: IndexKey,
    pub child: ChildRef,
}

#[derive(Debug, Clone)]
struct Node {
    leaf: bool,
    entries: Vec<IndexEntry>,
}

/// One result of a nearest-neighbour search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: RecordId,
    pub distance: f32,
}

/// Leaf node bounding box together with the records beneath it.
#[derive(Debug, Clone)]
pub struct LeafBox {
    pub key: IndexKey,
    pub records: Vec<RecordId>,
}

/// In-memory bounding-box tree over signatures.
///
/// Insertion descends by minimum [`IndexKey::penalty`] and splits
/// overflowing nodes with [`pick_split`]. Searches are best-first by
/// [`IndexKey::ordering_distance`] and every candidate is rechecked with the
/// exact signature distance before it is reported.
#[derive(Debug, Clone)]
pub struct SignatureTree {
    config: TreeConfig,
    nodes: Vec<Node>,
    root: NodeId,
    records: Vec<Signature>,
}

/// Sibling created when a node split during insertion.
struct Overflow {
    left_key: IndexKey,
    right_key: IndexKey,
    sibling: NodeId,
}

impl Default for SignatureTree {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl SignatureTree {
    pub fn new(config: TreeConfig) -> Self {
        let config = TreeConfig::with_max_entries(config.max_entries);
        Self {
            config,
            nodes: vec![Node {
                leaf: true,
                entries: Vec::new(),
            }],
            root: 0,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&Signature> {
        self.records.get(id)
    }

    /// Number of levels, counting the leaf level.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut node = &self.nodes[self.root];
        while !node.leaf {
            match node.entries.first().map(|entry| entry.child) {
                Some(ChildRef::Node(child)) => node = &self.nodes[child],
                _ => break,
            }
            depth += 1;
        }
        depth
    }

    /// Insert a signature and return its record id.
    pub fn insert(&mut self, signature: Signature) -> Result<RecordId> {
        let id = self.records.len();
        self.records.push(signature);

        let entry = IndexEntry {
            key: IndexKey::compress(&signature),
            child: ChildRef::Record(id),
        };

        if let Some(overflow) = self.insert_into(self.root, entry)? {
            let old_root = self.root;
            self.nodes.push(Node {
                leaf: false,
                entries: vec![
                    IndexEntry {
                        key: overflow.left_key,
                        child: ChildRef::Node(old_root),
                    },
                    IndexEntry {
                        key: overflow.right_key,
                        child: ChildRef::Node(overflow.sibling),
                    },
                ],
            });
            self.root = self.nodes.len() - 1;
            debug!("Tree grew to depth {}", self.depth());
        }

        Ok(id)
    }

    fn insert_into(&mut self, node_id: NodeId, entry: IndexEntry) -> Result<Option<Overflow>> {
        if self.nodes[node_id].leaf {
            self.nodes[node_id].entries.push(entry);
        } else {
            let slot = self.choose_subtree(node_id, &entry.key);
            let child = match self.nodes[node_id].entries[slot].child {
                ChildRef::Node(child) => child,
                ChildRef::Record(_) => unreachable!("internal entries always reference nodes"),
            };

            match self.insert_into(child, entry)? {
                Some(overflow) => {
                    let entries = &mut self.nodes[node_id].entries;
                    entries[slot].key = overflow.left_key;
                    entries.push(IndexEntry {
                        key: overflow.right_key,
                        child: ChildRef::Node(overflow.sibling),
                    });
                }
                None => self.nodes[node_id].entries[slot].key.extend(&entry.key),
            }
        }

        if self.nodes[node_id].entries.len() > self.config.max_entries {
            return self.split_node(node_id).map(Some);
        }
        Ok(None)
    }

    /// Entry with the smallest penalty, then the smallest volume; first wins ties.
    fn choose_subtree(&self, node_id: NodeId, key: &IndexKey) -> usize {
        let mut best = 0;
        let mut best_cost = (f32::INFINITY, f32::INFINITY);

        for (slot, entry) in self.nodes[node_id].entries.iter().enumerate() {
            let cost = (entry.key.penalty(key), entry.key.volume());
            if cost.partial_cmp(&best_cost) == Some(Ordering::Less) {
                best = slot;
                best_cost = cost;
            }
        }

        best
    }

    fn split_node(&mut self, node_id: NodeId) -> Result<Overflow> {
        let entries = std::mem::take(&mut self.nodes[node_id].entries);
        let keys: Vec<IndexKey> = entries.iter().map(|entry| entry.key).collect();
        let split = pick_split(&keys)?;

        let leaf = self.nodes[node_id].leaf;
        self.nodes[node_id].entries = split.left.iter().map(|&i| entries[i]).collect();
        self.nodes.push(Node {
            leaf,
            entries: split.right.iter().map(|&i| entries[i]).collect(),
        });

        debug!(
            "Split node {} into {} + {} entries",
            node_id,
            split.left.len(),
            split.right.len()
        );

        Ok(Overflow {
            left_key: split.left_key,
            right_key: split.right_key,
            sibling: self.nodes.len() - 1,
        })
    }

    /// The `k` records closest to `query`, nearest first.
    pub fn nearest(&self, query: &Signature, k: usize) -> Vec<Neighbor> {
        let mut results = Vec::new();
        if k == 0 || self.is_empty() {
            return results;
        }

        let mut queue = BinaryHeap::new();
        queue.push(Reverse(Candidate {
            distance: 0.0,
            item: Item::Node(self.root),
        }));

        while let Some(Reverse(candidate)) = queue.pop() {
            match candidate.item {
                Item::Node(node_id) => {
                    for entry in &self.nodes[node_id].entries {
                        let check = entry.key.consistent(query);
                        if !check.may_match {
                            continue;
                        }
                        let distance = entry.key.ordering_distance(query);
                        let item = match entry.child {
                            ChildRef::Node(child) => Item::Node(child),
                            ChildRef::Record(id) if check.recheck => Item::Unverified(id),
                            ChildRef::Record(id) => Item::Verified(id),
                        };
                        queue.push(Reverse(Candidate { distance, item }));
                    }
                }
                Item::Unverified(id) => {
                    let exact = self.records[id].distance(query);
                    queue.push(Reverse(Candidate {
                        distance: exact as f64,
                        item: Item::Verified(id),
                    }));
                }
                Item::Verified(id) => {
                    results.push(Neighbor {
                        id,
                        distance: candidate.distance as f32,
                    });
                    if results.len() == k {
                        break;
                    }
                }
            }
        }

        results
    }

    /// Bounding boxes of every leaf node.
    pub fn leaf_boxes(&self) -> Vec<LeafBox> {
        let mut boxes = Vec::new();
        let mut stack = vec![self.root];

        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id];
            if node.leaf {
                let keys: Vec<IndexKey> = node.entries.iter().map(|entry| entry.key).collect();
                if let Ok(key) = IndexKey::union(&keys) {
                    let records = node
                        .entries
                        .iter()
                        .filter_map(|entry| match entry.child {
                            ChildRef::Record(id) => Some(id),
                            ChildRef::Node(_) => None,
                        })
                        .collect();
                    boxes.push(LeafBox { key, records });
                }
            } else {
                stack.extend(node.entries.iter().filter_map(|entry| match entry.child {
                    ChildRef::Node(child) => Some(child),
                    ChildRef::Record(_) => None,
                }));
            }
        }

        boxes
    }

    /// Check that every internal key covers the keys beneath it.
    pub fn keys_cover_children(&self) -> bool {
        self.nodes.iter().filter(|node| !node.leaf).all(|node| {
            node.entries.iter().all(|entry| match entry.child {
                ChildRef::Node(child) => self.nodes[child]
                    .entries
                    .iter()
                    .all(|inner| covers(&entry.key, &inner.key)),
                ChildRef::Record(_) => false,
            })
        })
    }
}

fn covers(outer: &IndexKey, inner: &IndexKey) -> bool {
    outer
        .lower()
        .values
        .iter()
        .zip(inner.lower().values.iter())
        .all(|(o, i)| o <= i)
        && outer
            .upper()
            .values
            .iter()
            .zip(inner.upper().values.iter())
            .all(|(o, i)| o >= i)
}

#[derive(Debug, Clone, Copy)]
enum Item {
    Node(NodeId),
    Unverified(RecordId),
    Verified(RecordId),
}

impl Item {
    // Verified records surface before anything else at the same distance.
    fn rank(&self) -> u8 {
        match self {
            Item::Verified(_) => 0,
            Item::Unverified(_) => 1,
            Item::Node(_) => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    item: Item,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.item.rank().cmp(&other.item.rank()))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
