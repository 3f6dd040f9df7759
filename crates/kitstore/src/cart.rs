//! Shopping cart with persistence.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{Design, DesignError, KeyValueStorage, Product};

/// Storage key under which the cart is persisted.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Error produced when modifying the cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CartError {
    /// Quantity must be at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// There is no line with the given ID.
    #[error("no cart item with ID {0}")]
    NoSuchItem(u64),
    /// Design cannot be printed on the product.
    #[error("invalid design: {0}")]
    Design(#[from] DesignError),
}

/// Line in the shopping cart.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CartItem {
    /// ID of the line, unique within the cart.
    pub id: u64,
    /// ID of the product.
    pub product_id: String,
    /// Product name at the time it was added.
    pub name: String,
    /// Unit price in minor currency units at the time it was added.
    pub unit_price: i64,
    /// Number of units.
    pub quantity: u32,
    /// Design applied to the product.
    pub design: Design,
}
impl CartItem {
    /// Returns the price of the line in minor currency units.
    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }
}

/// Persisted portion of the cart.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
struct PersistedCart {
    items: Vec<CartItem>,
}

struct CartInner {
    items: Vec<CartItem>,
    next_id: u64,
    storage: Box<dyn KeyValueStorage>,
}
impl CartInner {
    /// Writes the items to storage. Failures are logged, not returned, so
    /// that the in-memory cart stays usable.
    fn persist(&mut self) {
        let data = PersistedCart {
            items: self.items.clone(),
        };
        let result = serde_json::to_string(&data)
            .map_err(eyre::Report::from)
            .and_then(|json| self.storage.set(CART_STORAGE_KEY, &json));
        if let Err(e) = result {
            log::error!("error saving cart: {e}");
        }
    }

    fn item_mut(&mut self, id: u64) -> Result<&mut CartItem, CartError> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(CartError::NoSuchItem(id))
    }
}

/// Shopping cart backed by key-value storage.
///
/// The cart is stored inside an `Arc<Mutex<T>>` so cloning this is cheap and
/// every clone sees the same items.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Mutex<CartInner>>,
}
impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.inner.lock().items)
            .finish_non_exhaustive()
    }
}
impl CartStore {
    /// Opens the cart persisted in `storage`. If the stored cart cannot be
    /// read, then it is backed up and the cart starts empty.
    pub fn open(mut storage: Box<dyn KeyValueStorage>) -> Self {
        let items = match storage.get(CART_STORAGE_KEY) {
            Ok(None) => vec![],
            Ok(Some(json)) => match serde_json::from_str::<PersistedCart>(&json) {
                Ok(persisted) => persisted.items,
                Err(e) => {
                    log::error!("error loading cart: {e}");
                    storage.backup(CART_STORAGE_KEY);
                    vec![]
                }
            },
            Err(e) => {
                log::error!("error reading cart storage: {e}");
                storage.backup(CART_STORAGE_KEY);
                vec![]
            }
        };
        log::debug!("loaded cart with {} items", items.len());

        let next_id = items.iter().map(|item| item.id + 1).max().unwrap_or(1);
        Self {
            inner: Arc::new(Mutex::new(CartInner {
                items,
                next_id,
                storage,
            })),
        }
    }

    /// Returns a snapshot of the items in the cart.
    pub fn items(&self) -> Vec<CartItem> {
        self.inner.lock().items.clone()
    }
    /// Returns the item with the given ID.
    pub fn get(&self, id: u64) -> Option<CartItem> {
        self.inner.lock().items.iter().find(|i| i.id == id).cloned()
    }
    /// Returns whether the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }
    /// Returns the total number of units in the cart.
    pub fn item_count(&self) -> u32 {
        self.inner.lock().items.iter().map(|item| item.quantity).sum()
    }
    /// Returns the total price in minor currency units.
    pub fn total(&self) -> i64 {
        self.inner
            .lock()
            .items
            .iter()
            .map(CartItem::line_total)
            .fold(0, i64::saturating_add)
    }

    /// Adds `quantity` units of a designed product. If the cart already has a
    /// line for the same product with an identical design, then the quantity
    /// is added to that line instead. Returns the ID of the line.
    pub fn add(&self, product: &Product, design: Design, quantity: u32) -> Result<u64, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        design.validate_for(product)?;

        let mut inner = self.inner.lock();
        let existing = inner
            .items
            .iter()
            .position(|item| item.product_id == product.id && item.design == design);
        let id = match existing {
            Some(i) => {
                let item = &mut inner.items[i];
                item.quantity = item.quantity.saturating_add(quantity);
                log::debug!("cart line {} now has {} units", item.id, item.quantity);
                item.id
            }
            None => {
                let id = inner.next_id;
                inner.next_id += 1;
                inner.items.push(CartItem {
                    id,
                    product_id: product.id.to_owned(),
                    name: product.name.to_owned(),
                    unit_price: product.price,
                    quantity,
                    design,
                });
                log::debug!("added cart line {id} for {}", product.id);
                id
            }
        };
        inner.persist();
        Ok(id)
    }

    /// Removes a line from the cart. Returns whether it existed.
    pub fn remove(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        let len_before = inner.items.len();
        inner.items.retain(|item| item.id != id);
        let removed = inner.items.len() != len_before;
        if removed {
            inner.persist();
        }
        removed
    }

    /// Sets the quantity of a line. Setting it to zero removes the line.
    pub fn set_quantity(&self, id: u64, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return match self.remove(id) {
                true => Ok(()),
                false => Err(CartError::NoSuchItem(id)),
            };
        }
        let mut inner = self.inner.lock();
        inner.item_mut(id)?.quantity = quantity;
        inner.persist();
        Ok(())
    }

    /// Removes every line from the cart.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        if !inner.items.is_empty() {
            inner.items.clear();
            inner.persist();
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{CanvasPosition, MemoryStorage, Rgb, product_by_id};

    fn mug_design(text: &str) -> Design {
        let mug = product_by_id("mug").unwrap();
        let mut design = Design::new(mug);
        design
            .add_text(text, "Inter", 32.0, Rgb::BLACK, CanvasPosition { x: 1.0, y: 1.0 })
            .unwrap();
        design
    }

    #[test]
    fn test_add_merges_identical_designs() {
        let cart = CartStore::open(Box::new(MemoryStorage::new()));
        let mug = product_by_id("mug").unwrap();

        let a = cart.add(mug, mug_design("A"), 1).unwrap();
        let a_again = cart.add(mug, mug_design("A"), 2).unwrap();
        let b = cart.add(mug, mug_design("B"), 1).unwrap();

        assert_eq!(a, a_again);
        assert_ne!(a, b);
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.total(), 4 * mug.price);
    }

    #[test]
    fn test_quantity_and_removal() {
        let cart = CartStore::open(Box::new(MemoryStorage::new()));
        let mug = product_by_id("mug").unwrap();

        assert_eq!(
            cart.add(mug, mug_design("A"), 0),
            Err(CartError::ZeroQuantity)
        );

        let id = cart.add(mug, mug_design("A"), 1).unwrap();
        cart.set_quantity(id, 5).unwrap();
        assert_eq!(cart.get(id).map(|i| i.quantity), Some(5));

        cart.set_quantity(id, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.set_quantity(id, 1), Err(CartError::NoSuchItem(id)));
        assert!(!cart.remove(id));
    }

    #[test]
    fn test_design_must_fit_product() {
        let cart = CartStore::open(Box::new(MemoryStorage::new()));
        let box_product = product_by_id("box").unwrap();
        assert_eq!(
            cart.add(box_product, mug_design("A"), 1),
            Err(CartError::Design(DesignError::CanvasMismatch)),
        );
    }

    #[test]
    fn test_cart_persists_items_only() {
        let dir = tempfile::tempdir().unwrap();
        let storage = crate::FileStorage::new(dir.path());
        let mug = product_by_id("mug").unwrap();

        let cart = CartStore::open(Box::new(storage.clone()));
        cart.add(mug, mug_design("A"), 2).unwrap();
        let second = cart.add(mug, mug_design("B"), 1).unwrap();
        let items = cart.items();
        drop(cart);

        let json = storage.get(CART_STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_object().unwrap().keys().collect::<Vec<_>>(), ["items"]);

        let reopened = CartStore::open(Box::new(storage));
        assert_eq!(reopened.items(), items);
        // IDs keep counting up after reload
        let third = reopened.add(mug, mug_design("C"), 1).unwrap();
        assert!(third > second);
    }

    /// Returns the backup files in `dir`.
    fn backup_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.file_name().unwrap().to_string_lossy().ends_with("_bak.json"))
            .collect()
    }

    fn assert_unreadable_cart_is_backed_up(contents: &[u8]) {
        let dir = tempfile::tempdir().unwrap();
        let storage = crate::FileStorage::new(dir.path());
        let cart_path = kitpaths::storage_file_in(dir.path(), CART_STORAGE_KEY);
        std::fs::write(&cart_path, contents).unwrap();

        let cart = CartStore::open(Box::new(storage.clone()));
        assert!(cart.is_empty());
        assert!(!cart_path.exists());
        let backups = backup_files(dir.path());
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read(&backups[0]).unwrap(), contents);

        // Writing the cart afterwards leaves the backup alone.
        let mug = product_by_id("mug").unwrap();
        cart.add(mug, mug_design("A"), 1).unwrap();
        assert_eq!(std::fs::read(&backups[0]).unwrap(), contents);
        let json = storage.get(CART_STORAGE_KEY).unwrap().unwrap();
        assert!(serde_json::from_str::<PersistedCart>(&json).is_ok());
    }

    #[test]
    fn test_corrupt_cart_is_backed_up() {
        assert_unreadable_cart_is_backed_up(b"{not json");
    }

    #[test]
    fn test_non_utf8_cart_is_backed_up() {
        assert_unreadable_cart_is_backed_up(&[0xff, 0xfe, b'{', b'}']);
    }

    #[test]
    fn test_clones_share_state() {
        let cart = CartStore::open(Box::new(MemoryStorage::new()));
        let other_view = cart.clone();
        let mug = product_by_id("mug").unwrap();
        cart.add(mug, mug_design("A"), 1).unwrap();
        assert_eq!(other_view.item_count(), 1);
        other_view.clear();
        assert!(cart.is_empty());
    }
}
