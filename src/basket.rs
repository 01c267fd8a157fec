use crate::itemset::{ItemId, Itemset};
use ahash::AHashMap as HashMap;
use std::collections::BTreeSet;
use std::hash::Hash;

/// One raw line of transaction data.
///
/// Records with a missing or unparseable transaction id must be dropped by the
/// loader before they reach the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<Tid, T> {
    pub transaction_id: Tid,
    pub item: T,
    pub quantity: i64,
}

impl<Tid, T> Record<Tid, T> {
    pub fn new(transaction_id: Tid, item: T, quantity: i64) -> Self {
        Self {
            transaction_id,
            item,
            quantity,
        }
    }
}

/// Boolean transaction × item presence matrix, stored sparsely.
///
/// Items are interned into a sorted vocabulary; each row keeps the ids of the
/// items present in that transaction in increasing order. A basket is built
/// once and only read afterwards.
///
/// # Example
///
/// ```
/// use basket_miner::{Basket, Record};
///
/// let basket = Basket::from_records(vec![
///     Record::new("T1", "milk", 2),
///     Record::new("T1", "bread", 1),
///     Record::new("T2", "milk", 1),
///     Record::new("T2", "milk", -1),
/// ]);
///
/// // T2's milk nets out to zero, leaving T2 empty and dropped
/// assert_eq!(basket.len(), 1);
/// assert_eq!(basket.vocabulary(), &["bread", "milk"]);
/// ```
#[derive(Debug, Clone)]
pub struct Basket<T, Tid = String> {
    vocabulary: Vec<T>,
    transaction_ids: Vec<Tid>,
    rows: Vec<Vec<ItemId>>,
}

impl<T, Tid> Default for Basket<T, Tid> {
    fn default() -> Self {
        Self {
            vocabulary: Vec::new(),
            transaction_ids: Vec::new(),
            rows: Vec::new(),
        }
    }
}

impl<T: Ord + Hash + Clone, Tid: Hash + Eq + Clone> Basket<T, Tid> {
    /// Encodes raw `(transaction, item, quantity)` records.
    ///
    /// Quantities of the same item within a transaction are summed; the item
    /// is present when the sum is at least 1. Transactions left without any
    /// present item are dropped. Transactions keep first-appearance order.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record<Tid, T>>,
    {
        let mut order: HashMap<Tid, usize> = HashMap::default();
        let mut grouped: Vec<(Tid, HashMap<T, i64>)> = Vec::new();

        for record in records {
            let slot = *order
                .entry(record.transaction_id.clone())
                .or_insert_with(|| {
                    grouped.push((record.transaction_id.clone(), HashMap::default()));
                    grouped.len() - 1
                });
            *grouped[slot].1.entry(record.item).or_insert(0) += record.quantity;
        }

        let present = grouped.into_iter().map(|(tid, quantities)| {
            let items: Vec<T> = quantities
                .into_iter()
                .filter(|&(_, quantity)| quantity >= 1)
                .map(|(item, _)| item)
                .collect();
            (tid, items)
        });

        Self::from_transactions(present)
    }

    /// Builds a basket from transactions given as plain item collections.
    ///
    /// Duplicate items collapse to presence, repeated transaction ids are
    /// merged, and empty transactions are dropped.
    pub fn from_transactions<I, J>(transactions: I) -> Self
    where
        I: IntoIterator<Item = (Tid, J)>,
        J: IntoIterator<Item = T>,
    {
        let mut order: HashMap<Tid, usize> = HashMap::default();
        let mut merged: Vec<(Tid, Vec<T>)> = Vec::new();

        for (tid, items) in transactions {
            match order.get(&tid) {
                Some(&slot) => merged[slot].1.extend(items),
                None => {
                    order.insert(tid.clone(), merged.len());
                    merged.push((tid, items.into_iter().collect()));
                }
            }
        }
        merged.retain(|(_, items)| !items.is_empty());

        let vocabulary: Vec<T> = merged
            .iter()
            .flat_map(|(_, items)| items.iter().cloned())
            .collect::<BTreeSet<T>>()
            .into_iter()
            .collect();

        let mut transaction_ids = Vec::with_capacity(merged.len());
        let mut rows = Vec::with_capacity(merged.len());
        for (tid, items) in merged {
            let mut row: Vec<ItemId> = items
                .iter()
                .filter_map(|item| vocabulary.binary_search(item).ok())
                .map(|idx| idx as ItemId)
                .collect();
            row.sort_unstable();
            row.dedup();
            transaction_ids.push(tid);
            rows.push(row);
        }

        Self {
            vocabulary,
            transaction_ids,
            rows,
        }
    }

    /// Looks up the id of an item, if it occurs in the basket.
    pub fn item_id(&self, item: &T) -> Option<ItemId> {
        self.vocabulary
            .binary_search(item)
            .ok()
            .map(|idx| idx as ItemId)
    }
}

impl<T, Tid> Basket<T, Tid> {
    /// Number of (non-empty) transactions.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// An empty basket cannot be mined.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct items in canonical order; position equals [`ItemId`].
    pub fn vocabulary(&self) -> &[T] {
        &self.vocabulary
    }

    /// # Panics
    ///
    /// Panics if `id` is not an id of this basket's vocabulary. Use
    /// [`Basket::get_item`] for ids of unknown origin.
    pub fn item(&self, id: ItemId) -> &T {
        &self.vocabulary[id as usize]
    }

    pub fn get_item(&self, id: ItemId) -> Option<&T> {
        self.vocabulary.get(id as usize)
    }

    pub fn rows(&self) -> &[Vec<ItemId>] {
        &self.rows
    }

    pub fn transaction_ids(&self) -> &[Tid] {
        &self.transaction_ids
    }

    /// Iterates `(transaction id, item ids)` pairs.
    pub fn transactions(&self) -> impl Iterator<Item = (&Tid, &[ItemId])> {
        self.transaction_ids
            .iter()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    /// Maps an itemset back to item references, in canonical order.
    ///
    /// # Panics
    ///
    /// Panics if the itemset holds an id outside this basket's vocabulary,
    /// as happens with itemsets mined from a different basket.
    pub fn resolve(&self, itemset: &Itemset) -> Vec<&T> {
        itemset.items().iter().map(|&id| self.item(id)).collect()
    }

    /// Like [`Basket::resolve`], but `None` on an unknown id.
    pub fn try_resolve(&self, itemset: &Itemset) -> Option<Vec<&T>> {
        itemset.items().iter().map(|&id| self.get_item(id)).collect()
    }

    /// Dense presence matrix, one row per transaction and one column per item.
    pub fn to_dense(&self) -> Vec<Vec<bool>> {
        self.rows
            .iter()
            .map(|row| {
                let mut dense = vec![false; self.vocabulary.len()];
                for &id in row {
                    dense[id as usize] = true;
                }
                dense
            })
            .collect()
    }

    /// Number of transactions containing each item, indexed by [`ItemId`].
    pub fn item_supports(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.vocabulary.len()];
        for row in &self.rows {
            for &id in row {
                counts[id as usize] += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantities_summed_then_thresholded() {
        let basket = Basket::from_records(vec![
            Record::new(1, "jam", 1),
            Record::new(1, "tea", 3),
            Record::new(1, "jam", -1),
            Record::new(2, "tea", 0),
            Record::new(2, "jam", 2),
        ]);

        assert_eq!(basket.len(), 2);
        assert_eq!(basket.vocabulary(), &["jam", "tea"]);
        let jam = basket.item_id(&"jam").unwrap();
        let tea = basket.item_id(&"tea").unwrap();
        assert_eq!(basket.rows()[0], vec![tea]);
        assert_eq!(basket.rows()[1], vec![jam]);
    }

    #[test]
    fn test_empty_transactions_dropped() {
        let basket = Basket::from_records(vec![
            Record::new("a", "x", 0),
            Record::new("b", "y", -4),
            Record::new("c", "x", 1),
        ]);
        assert_eq!(basket.len(), 1);
        assert_eq!(basket.transaction_ids(), &["c"]);
        // Items that are never present do not enter the vocabulary
        assert_eq!(basket.vocabulary(), &["x"]);
    }

    #[test]
    fn test_empty_input() {
        let basket: Basket<&str, u32> = Basket::from_records(Vec::new());
        assert!(basket.is_empty());
        assert!(basket.vocabulary().is_empty());
        assert!(basket.to_dense().is_empty());
    }

    #[test]
    fn test_from_transactions_merges_ids() {
        let basket = Basket::from_transactions(vec![
            ("T1", vec!["milk", "milk"]),
            ("T2", vec![]),
            ("T1", vec!["bread"]),
        ]);
        assert_eq!(basket.len(), 1);
        assert_eq!(basket.rows()[0], vec![0, 1]);
        assert_eq!(basket.resolve(&Itemset::new([1, 0]).unwrap()), vec![&"bread", &"milk"]);
    }

    #[test]
    fn test_foreign_ids_resolve_to_none() {
        let basket = Basket::from_transactions(vec![("T1", vec!["milk", "bread"])]);
        assert_eq!(basket.get_item(1), Some(&"milk"));
        assert_eq!(basket.get_item(2), None);
        assert_eq!(
            basket.try_resolve(&Itemset::new([0, 1]).unwrap()),
            Some(vec![&"bread", &"milk"])
        );
        assert_eq!(basket.try_resolve(&Itemset::new([0, 7]).unwrap()), None);
    }

    #[test]
    #[should_panic]
    fn test_resolve_foreign_itemset_panics() {
        let basket = Basket::from_transactions(vec![(1, vec!['a'])]);
        basket.resolve(&Itemset::single(3));
    }

    #[test]
    fn test_dense_and_supports() {
        let basket = Basket::from_transactions(vec![
            (1, vec!['a', 'b']),
            (2, vec!['b']),
        ]);
        assert_eq!(basket.to_dense(), vec![vec![true, true], vec![false, true]]);
        assert_eq!(basket.item_supports(), vec![1, 2]);
        let pairs: Vec<(&i32, &[ItemId])> = basket.transactions().collect();
        assert_eq!(pairs[1], (&2, &[1][..]));
    }
}
