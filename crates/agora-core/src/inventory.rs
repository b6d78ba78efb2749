//! Seller inventory: title -> price
//!
//! Presence means the title is for sale. `remove` is the only way to mark a
//! title sold, and it is atomic per title: when several confirmation handlers
//! race on the same title exactly one of them gets the price back.

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct Inventory {
    items: DashMap<String, u64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a title's price
    pub fn put(&self, title: impl Into<String>, price: u64) -> Option<u64> {
        self.items.insert(title.into(), price)
    }

    pub fn lookup(&self, title: &str) -> Option<u64> {
        self.items.get(title).map(|entry| *entry)
    }

    /// Atomically take a title out of the inventory
    pub fn remove(&self, title: &str) -> Option<u64> {
        self.items.remove(title).map(|(_, price)| price)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sorted snapshot of the titles currently for sale
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self.items.iter().map(|e| e.key().clone()).collect();
        titles.sort();
        titles
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let inventory = Inventory::new();
        for (title, price) in iter {
            inventory.put(title, price);
        }
        inventory
    }
}
