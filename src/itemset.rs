use ahash::AHashMap as HashMap;
use std::cmp::Ordering;

/// Interned item identifier.
///
/// Ids index into the basket's sorted vocabulary, so comparing ids compares
/// the items they stand for.
pub type ItemId = u32;

/// A non-empty, canonically sorted set of items.
///
/// Equality, hashing and ordering are defined over the sorted id sequence, so
/// the same items always produce the same key regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Itemset(Vec<ItemId>);

impl Itemset {
    /// Builds an itemset from arbitrary ids, sorting and collapsing duplicates.
    ///
    /// Returns `None` when no ids are given.
    pub fn new<I: IntoIterator<Item = ItemId>>(ids: I) -> Option<Self> {
        let mut items: Vec<ItemId> = ids.into_iter().collect();
        if items.is_empty() {
            return None;
        }
        items.sort_unstable();
        items.dedup();
        Some(Itemset(items))
    }

    /// Wraps ids that are already sorted, unique and non-empty.
    pub(crate) fn from_sorted(items: Vec<ItemId>) -> Self {
        debug_assert!(!items.is_empty(), "itemsets are never empty");
        debug_assert!(
            items.windows(2).all(|w| w[0] < w[1]),
            "itemset ids must be strictly increasing"
        );
        Itemset(items)
    }

    pub fn single(item: ItemId) -> Self {
        Itemset(vec![item])
    }

    pub fn items(&self) -> &[ItemId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.0.binary_search(&item).is_ok()
    }

    /// True when every item of `self` occurs in the sorted slice `row`.
    pub fn is_subset_of(&self, row: &[ItemId]) -> bool {
        is_sorted_subset(&self.0, row)
    }

    /// Items of `self` that are not in `other`, or `None` if nothing remains.
    pub fn difference(&self, other: &Itemset) -> Option<Itemset> {
        let rest: Vec<ItemId> = self
            .0
            .iter()
            .copied()
            .filter(|item| !other.contains(*item))
            .collect();
        if rest.is_empty() {
            None
        } else {
            Some(Itemset(rest))
        }
    }

    /// All subsets with exactly `size` items, in lexicographic order.
    pub fn subsets(&self, size: usize) -> impl Iterator<Item = Itemset> + '_ {
        combinations(&self.0, size).map(Itemset)
    }

    /// Every non-empty proper subset, smallest first.
    pub fn proper_subsets(&self) -> impl Iterator<Item = Itemset> + '_ {
        (1..self.len()).flat_map(move |size| self.subsets(size))
    }

    /// Canonical listing order: shorter itemsets first, then lexicographic.
    pub fn canonical_cmp(&self, other: &Itemset) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

/// Merge-walk subset test over two strictly increasing slices.
pub(crate) fn is_sorted_subset(needle: &[ItemId], haystack: &[ItemId]) -> bool {
    if needle.len() > haystack.len() {
        return false;
    }
    let mut rest = haystack.iter();
    'outer: for &wanted in needle {
        for &have in rest.by_ref() {
            match have.cmp(&wanted) {
                Ordering::Less => continue,
                Ordering::Equal => continue 'outer,
                Ordering::Greater => return false,
            }
        }
        return false;
    }
    true
}

/// Lexicographic k-combinations of a slice.
pub(crate) fn combinations<T: Copy>(items: &[T], size: usize) -> impl Iterator<Item = Vec<T>> + '_ {
    let n = items.len();
    let mut indices: Vec<usize> = (0..size).collect();
    let mut first = true;

    std::iter::from_fn(move || {
        if size == 0 || n < size {
            return None;
        }
        if first {
            first = false;
        } else {
            let mut i = size;
            loop {
                if i == 0 {
                    return None;
                }
                i -= 1;
                if indices[i] < n - size + i {
                    break;
                }
            }
            indices[i] += 1;
            for j in (i + 1)..size {
                indices[j] = indices[j - 1] + 1;
            }
        }
        Some(indices.iter().map(|&i| items[i]).collect())
    })
}

/// Smallest transaction count whose ratio `count / n` reaches `min_support`.
///
/// Both miners filter on this count so that they agree exactly with the
/// floating-point `ratio >= min_support` rule. Never below 1.
pub(crate) fn min_count(n_transactions: usize, min_support: f64) -> u64 {
    if n_transactions == 0 {
        return 1;
    }
    let n = n_transactions as f64;
    let estimate = (min_support * n).ceil().max(1.0);
    if estimate > n {
        return n_transactions as u64 + 1;
    }
    let mut count = estimate as u64;
    while count > 1 && (count - 1) as f64 / n >= min_support {
        count -= 1;
    }
    while count <= n_transactions as u64 && (count as f64 / n) < min_support {
        count += 1;
    }
    count
}

/// An itemset together with its support.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemset {
    pub itemset: Itemset,
    /// Number of transactions containing every item of the set.
    pub count: u64,
    /// `count / |basket|`.
    pub support: f64,
}

/// The frequent itemsets mined at one support threshold.
///
/// Stored in canonical order (by length, then lexicographically) with a
/// lookup index from itemset to entry.
#[derive(Debug, Clone)]
pub struct FrequentItemsets {
    n_transactions: usize,
    min_support: f64,
    itemsets: Vec<FrequentItemset>,
    index: HashMap<Itemset, usize>,
}

impl FrequentItemsets {
    pub(crate) fn from_counts(
        n_transactions: usize,
        min_support: f64,
        mut counts: Vec<(Itemset, u64)>,
    ) -> Self {
        counts.sort_unstable_by(|a, b| a.0.canonical_cmp(&b.0));
        let n = n_transactions.max(1) as f64;
        let itemsets: Vec<FrequentItemset> = counts
            .into_iter()
            .map(|(itemset, count)| FrequentItemset {
                itemset,
                count,
                support: count as f64 / n,
            })
            .collect();
        let index = itemsets
            .iter()
            .enumerate()
            .map(|(i, f)| (f.itemset.clone(), i))
            .collect();
        Self {
            n_transactions,
            min_support,
            itemsets,
            index,
        }
    }

    pub(crate) fn empty(n_transactions: usize, min_support: f64) -> Self {
        Self::from_counts(n_transactions, min_support, Vec::new())
    }

    /// Size of the basket these itemsets were mined from.
    pub fn n_transactions(&self) -> usize {
        self.n_transactions
    }

    /// Threshold used when mining.
    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrequentItemset> {
        self.itemsets.iter()
    }

    pub fn get(&self, itemset: &Itemset) -> Option<&FrequentItemset> {
        self.index.get(itemset).map(|&i| &self.itemsets[i])
    }

    pub fn count(&self, itemset: &Itemset) -> Option<u64> {
        self.get(itemset).map(|f| f.count)
    }

    pub fn contains(&self, itemset: &Itemset) -> bool {
        self.index.contains_key(itemset)
    }

    /// Length of the largest frequent itemset, 0 when empty.
    pub fn max_len(&self) -> usize {
        self.itemsets.last().map_or(0, |f| f.itemset.len())
    }

    /// `(itemset, count)` pairs in canonical order.
    pub fn counts(&self) -> Vec<(Itemset, u64)> {
        self.itemsets
            .iter()
            .map(|f| (f.itemset.clone(), f.count))
            .collect()
    }
}

impl<'a> IntoIterator for &'a FrequentItemsets {
    type Item = &'a FrequentItemset;
    type IntoIter = std::slice::Iter<'a, FrequentItemset>;

    fn into_iter(self) -> Self::IntoIter {
        self.itemsets.iter()
    }
}
