//! FP-Growth miner.
//!
//! Transactions are compressed into a prefix tree whose nodes live in a
//! [`SlotMap`] arena: each node knows its parent key and its children by item,
//! and a header table lists every node carrying a given item. Mining walks
//! the header table bottom-up, building a conditional tree per item from the
//! prefix paths above its nodes. No candidate itemsets are ever generated.

use crate::basket::Basket;
use crate::itemset::{combinations, min_count, FrequentItemsets, ItemId, Itemset};
use rayon::prelude::*;
use slotmap::{DefaultKey, SlotMap};

/// Below this many header items the top level is mined on the current thread.
const PAR_ITEMS_CUTOFF: usize = 4;

/// Tree-local item position; rank 0 is the most frequent item.
type Rank = usize;

/// A node of the prefix tree.
#[derive(Debug)]
struct FpNode {
    /// `None` only for the root.
    rank: Option<Rank>,
    count: u64,
    parent: Option<DefaultKey>,
    children: Vec<(Rank, DefaultKey)>,
}

impl FpNode {
    fn new(rank: Option<Rank>, count: u64, parent: Option<DefaultKey>) -> Self {
        Self {
            rank,
            count,
            parent,
            children: Vec::new(),
        }
    }
}

/// Prefix tree over transactions whose items are ordered by descending
/// support (ties broken by item id).
#[derive(Debug)]
pub(crate) struct FpTree {
    nodes: SlotMap<DefaultKey, FpNode>,
    root: DefaultKey,
    /// Rank -> basket item id.
    items: Vec<ItemId>,
    /// Rank -> every node carrying that item.
    header: Vec<Vec<DefaultKey>>,
    /// False once any node has more than one child.
    single_path: bool,
}

impl FpTree {
    /// Creates an empty tree for the given ranked items.
    fn new(items: Vec<ItemId>) -> Self {
        let mut nodes = SlotMap::new();
        let root = nodes.insert(FpNode::new(None, 0, None));
        let header = vec![Vec::new(); items.len()];
        Self {
            nodes,
            root,
            items,
            header,
            single_path: true,
        }
    }

    /// Ranks the items that reach `min_count`, most frequent first.
    ///
    /// `counts` pairs an item id with its support in the data the tree will be
    /// built from.
    fn rank_items(counts: impl IntoIterator<Item = (ItemId, u64)>, min_count: u64) -> Vec<ItemId> {
        let mut frequent: Vec<(ItemId, u64)> = counts
            .into_iter()
            .filter(|&(_, count)| count >= min_count)
            .collect();
        frequent.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        frequent.into_iter().map(|(id, _)| id).collect()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn child(&self, node: DefaultKey, rank: Rank) -> Option<DefaultKey> {
        self.nodes[node]
            .children
            .iter()
            .find(|&&(r, _)| r == rank)
            .map(|&(_, key)| key)
    }

    /// Inserts one path of ranks, which must be strictly increasing.
    fn insert(&mut self, ranks: &[Rank], count: u64) {
        let mut node = self.root;
        self.nodes[node].count += count;
        for &rank in ranks {
            node = match self.child(node, rank) {
                Some(child) => {
                    self.nodes[child].count += count;
                    child
                }
                None => {
                    let child = self.nodes.insert(FpNode::new(Some(rank), count, Some(node)));
                    let parent = &mut self.nodes[node];
                    parent.children.push((rank, child));
                    if parent.children.len() > 1 {
                        self.single_path = false;
                    }
                    self.header[rank].push(child);
                    child
                }
            };
        }
    }

    /// Total count of an item across all of its nodes.
    fn support(&self, rank: Rank) -> u64 {
        self.header[rank].iter().map(|&key| self.nodes[key].count).sum()
    }

    /// Ranks on the path from the root down to (excluding) `node`.
    fn prefix_path(&self, node: DefaultKey, path: &mut Vec<Rank>) {
        path.clear();
        let mut current = self.nodes[node].parent;
        while let Some(key) = current {
            let parent = &self.nodes[key];
            match parent.rank {
                Some(rank) => path.push(rank),
                None => break,
            }
            current = parent.parent;
        }
        path.reverse();
    }

    /// Builds the conditional tree for `rank` from its pattern base.
    fn conditional(&self, rank: Rank, min_count: u64) -> FpTree {
        let mut base: Vec<(Vec<Rank>, u64)> = Vec::with_capacity(self.header[rank].len());
        let mut counts = vec![0u64; rank];
        let mut path = Vec::new();
        for &key in &self.header[rank] {
            self.prefix_path(key, &mut path);
            if path.is_empty() {
                continue;
            }
            let count = self.nodes[key].count;
            for &r in &path {
                counts[r] += count;
            }
            base.push((path.clone(), count));
        }

        let mut frequent: Vec<(Rank, u64)> = counts
            .into_iter()
            .enumerate()
            .filter(|&(_, count)| count >= min_count)
            .collect();
        frequent.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(self.items[a.0].cmp(&self.items[b.0])));

        let mut to_local = vec![None; rank];
        let mut ranked = Vec::with_capacity(frequent.len());
        for (local, &(r, _)) in frequent.iter().enumerate() {
            to_local[r] = Some(local);
            ranked.push(self.items[r]);
        }

        let mut tree = FpTree::new(ranked);
        let mut filtered = Vec::new();
        for (path, count) in base {
            filtered.clear();
            filtered.extend(path.iter().filter_map(|&r| to_local[r]));
            if filtered.is_empty() {
                continue;
            }
            filtered.sort_unstable();
            tree.insert(&filtered, count);
        }
        tree
    }

    /// Emits every itemset of this tree, each extended with `suffix`.
    fn grow(&self, suffix: &[ItemId], min_count: u64, out: &mut Vec<(Itemset, u64)>) {
        if self.is_empty() {
            return;
        }
        if self.single_path {
            self.emit_path(suffix, out);
            return;
        }
        for rank in (0..self.items.len()).rev() {
            self.grow_item(rank, suffix, min_count, out);
        }
    }

    fn grow_item(&self, rank: Rank, suffix: &[ItemId], min_count: u64, out: &mut Vec<(Itemset, u64)>) {
        let mut extended = Vec::with_capacity(suffix.len() + 1);
        extended.extend_from_slice(suffix);
        extended.push(self.items[rank]);
        out.push((to_itemset(&extended), self.support(rank)));

        let conditional = self.conditional(rank, min_count);
        conditional.grow(&extended, min_count, out);
    }

    /// Base case: every combination of a single path, with the count of its
    /// deepest chosen node.
    fn emit_path(&self, suffix: &[ItemId], out: &mut Vec<(Itemset, u64)>) {
        let mut path: Vec<(ItemId, u64)> = Vec::with_capacity(self.items.len());
        let mut node = self.root;
        while let Some(&(_, child)) = self.nodes[node].children.first() {
            let entry = &self.nodes[child];
            if let Some(rank) = entry.rank {
                path.push((self.items[rank], entry.count));
            }
            node = child;
        }

        let positions: Vec<usize> = (0..path.len()).collect();
        for size in 1..=path.len() {
            for combo in combinations(&positions, size) {
                let deepest = combo[combo.len() - 1];
                let mut ids = suffix.to_vec();
                ids.extend(combo.iter().map(|&p| path[p].0));
                out.push((to_itemset(&ids), path[deepest].1));
            }
        }
    }
}

fn to_itemset(ids: &[ItemId]) -> Itemset {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    Itemset::from_sorted(sorted)
}

/// Builds the global tree for a basket.
pub(crate) fn build_tree<T, Tid>(basket: &Basket<T, Tid>, min_count: u64) -> FpTree {
    let supports = basket.item_supports();
    let ranked = FpTree::rank_items(
        supports.iter().enumerate().map(|(id, &count)| (id as ItemId, count)),
        min_count,
    );
    let mut to_rank: Vec<Option<Rank>> = vec![None; supports.len()];
    for (rank, &id) in ranked.iter().enumerate() {
        to_rank[id as usize] = Some(rank);
    }

    let mut paths: Vec<Vec<Rank>> = basket
        .rows()
        .iter()
        .filter_map(|row| {
            let mut path: Vec<Rank> = row.iter().filter_map(|&id| to_rank[id as usize]).collect();
            if path.is_empty() {
                return None;
            }
            path.sort_unstable();
            Some(path)
        })
        .collect();
    // Identical transactions become one weighted insertion.
    paths.sort_unstable();

    let mut tree = FpTree::new(ranked);
    let mut i = 0;
    while i < paths.len() {
        let mut j = i + 1;
        while j < paths.len() && paths[j] == paths[i] {
            j += 1;
        }
        tree.insert(&paths[i], (j - i) as u64);
        i = j;
    }
    tree
}

/// Mines every itemset whose support ratio is at least `min_support`.
///
/// Produces exactly the same itemsets and counts as
/// [`mine_apriori`](crate::mine_apriori).
pub fn mine_fpgrowth<T, Tid>(basket: &Basket<T, Tid>, min_support: f64) -> FrequentItemsets {
    let n = basket.len();
    if n == 0 {
        return FrequentItemsets::empty(n, min_support);
    }
    let min_count = min_count(n, min_support);
    let tree = build_tree(basket, min_count);

    let mut found = Vec::new();
    if tree.single_path || tree.items.len() < PAR_ITEMS_CUTOFF {
        tree.grow(&[], min_count, &mut found);
    } else {
        let per_item: Vec<Vec<(Itemset, u64)>> = (0..tree.items.len())
            .into_par_iter()
            .map(|rank| {
                let mut out = Vec::new();
                tree.grow_item(rank, &[], min_count, &mut out);
                out
            })
            .collect();
        found = per_item.into_iter().flatten().collect();
    }

    FrequentItemsets::from_counts(n, min_support, found)
}
