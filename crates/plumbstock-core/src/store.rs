//! The inventory item store.
//!
//! [`ItemStore`] owns the single persisted item array and is the only code
//! that reads or writes it. Reads fail soft: missing, corrupt, or unreadable
//! content lists as empty. Writes return a [`Result`] so callers can branch on
//! a rejected write (disabled storage, quota) instead of assuming success.

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, warn};

use crate::category::filter_by_category;
use crate::config::StoreConfig;
use crate::draft::ItemDraft;
use crate::error::{Result, StorageError, StoreError};
use crate::event::StoreEvent;
use crate::item::{Category, InventoryItem, ItemId};
use crate::storage::{KeyValueStorage, StorageChange};

/// How an update was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// An existing record was found by id or item code and replaced in place.
    Replaced(InventoryItem),
    /// No record matched, so the draft was inserted as a new item.
    Inserted(InventoryItem),
}

impl UpdateOutcome {
    pub fn item(&self) -> &InventoryItem {
        match self {
            UpdateOutcome::Replaced(item) | UpdateOutcome::Inserted(item) => item,
        }
    }

    pub fn into_item(self) -> InventoryItem {
        match self {
            UpdateOutcome::Replaced(item) | UpdateOutcome::Inserted(item) => item,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, UpdateOutcome::Inserted(_))
    }
}

/// Bounded, most-recent-first item collection over a key-value backend.
pub struct ItemStore<S: KeyValueStorage> {
    storage: S,
    config: StoreConfig,
    write_lock: Mutex<()>,
    subscribers: Mutex<Vec<Sender<StoreEvent>>>,
}

impl<S: KeyValueStorage> ItemStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, StoreConfig::default())
    }

    /// Store over `storage` with `config`. A zero capacity is raised to 1 so
    /// an added item is always kept.
    pub fn with_config(storage: S, mut config: StoreConfig) -> Self {
        if config.capacity == 0 {
            warn!("Store capacity of 0 raised to 1");
            config.capacity = 1;
        }
        Self {
            storage,
            config,
            write_lock: Mutex::new(()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// All items, most recent first. Never fails: unreadable or corrupt
    /// content is logged and lists as empty.
    pub fn list(&self) -> Vec<InventoryItem> {
        match self.read_items() {
            Ok(items) => items,
            Err(e) => {
                warn!("Could not read stored items: {}", e);
                Vec::new()
            }
        }
    }

    pub fn get(&self, id: ItemId) -> Option<InventoryItem> {
        self.list().into_iter().find(|item| item.id == id)
    }

    /// Normalize `draft` into a new item at the head of the collection.
    pub fn add(&self, draft: ItemDraft) -> Result<InventoryItem> {
        let _guard = self.lock_writes()?;
        let mut items = self.read_items()?;
        let (item, evicted) = self.insert_new(&mut items, draft);
        self.write_items(&items)?;

        debug!("Added item {} ({}), collection size {}", item.id, item.name, items.len());
        self.emit(StoreEvent::Added(Box::new(item.clone())));
        for id in evicted {
            self.emit(StoreEvent::Evicted(id));
        }
        Ok(item)
    }

    /// Merge `draft` into the record it addresses.
    ///
    /// The record is located by id, then by item code. When neither matches
    /// the draft is inserted as a new item and reported as
    /// [`UpdateOutcome::Inserted`]. A successful update clears the edit slot.
    pub fn update(&self, draft: ItemDraft) -> Result<UpdateOutcome> {
        let _guard = self.lock_writes()?;
        let mut items = self.read_items()?;

        let by_id = draft
            .id()
            .and_then(|id| items.iter().position(|item| item.id == id));
        let index = by_id.or_else(|| {
            let code = draft.lookup_code()?;
            let found = items.iter().position(|item| item.item_code == code);
            debug!("Item not found by id, searched by item code {}: {:?}", code, found);
            found
        });

        let (outcome, evicted) = match index {
            Some(i) => {
                let modified = advance_from(items[i].date_modified);
                let merged = draft.merge_into(&items[i], modified);
                items[i] = merged.clone();
                (UpdateOutcome::Replaced(merged), Vec::new())
            }
            None => {
                debug!("Item not found for update, adding as new");
                let (item, evicted) = self.insert_new(&mut items, draft);
                (UpdateOutcome::Inserted(item), evicted)
            }
        };

        self.write_items(&items)?;
        if let Err(e) = self.storage.remove(&self.config.edit_key) {
            warn!("Could not clear staged edit: {}", e);
        }

        match &outcome {
            UpdateOutcome::Replaced(item) => {
                debug!("Updated item {}", item.id);
                self.emit(StoreEvent::Updated(Box::new(item.clone())));
            }
            UpdateOutcome::Inserted(item) => {
                self.emit(StoreEvent::Added(Box::new(item.clone())));
            }
        }
        for id in evicted {
            self.emit(StoreEvent::Evicted(id));
        }
        Ok(outcome)
    }

    /// Remove the record with `id` and return what remains. An unknown id
    /// leaves the collection untouched.
    pub fn delete(&self, id: ItemId) -> Result<Vec<InventoryItem>> {
        let _guard = self.lock_writes()?;
        let mut items = self.read_items()?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            debug!("Delete of unknown item {} ignored", id);
            return Ok(items);
        }

        self.write_items(&items)?;
        debug!("Deleted item {}", id);
        self.emit(StoreEvent::Deleted(id));
        Ok(items)
    }

    /// Drop the whole collection.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock_writes()?;
        self.storage.remove(&self.config.items_key)?;
        debug!("Cleared stored items");
        self.emit(StoreEvent::Cleared);
        Ok(())
    }

    /// Stored items shown under `category`, followed by fallback samples
    /// whose ids are not already present.
    pub fn filter_by_category(
        &self,
        category: Category,
        fallback: &[InventoryItem],
    ) -> Vec<InventoryItem> {
        filter_by_category(&self.list(), category, fallback)
    }

    /// Hand `item` to an edit form through the edit slot.
    pub fn stage_for_edit(&self, item: &InventoryItem) -> Result<()> {
        let json = serde_json::to_string(item)?;
        self.storage.set(&self.config.edit_key, &json)?;
        Ok(())
    }

    /// The item waiting in the edit slot, if any and readable.
    pub fn staged_for_edit(&self) -> Option<InventoryItem> {
        let raw = match self.storage.get(&self.config.edit_key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Could not read staged edit: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Discarding unreadable staged edit: {}", e);
                None
            }
        }
    }

    pub fn clear_staged(&self) -> Result<()> {
        self.storage.remove(&self.config.edit_key)?;
        Ok(())
    }

    /// Receive events for writes made through this store.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        match self.subscribers.lock() {
            Ok(mut subs) => subs.push(tx),
            Err(e) => warn!("Subscriber list unavailable: {}", e),
        }
        rx
    }

    /// Receive change notifications for the items key from any writer
    /// sharing the backend. `None` when the backend cannot notify.
    pub fn watch_external(&self) -> Option<Receiver<StorageChange>> {
        self.storage.watch(&self.config.items_key)
    }

    fn lock_writes(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| StoreError::Storage(StorageError::Unavailable(e.to_string())))
    }

    fn emit(&self, event: StoreEvent) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    /// Current collection. Backend failures propagate; malformed content
    /// reads as empty and is replaced by the next successful write.
    fn read_items(&self) -> Result<Vec<InventoryItem>> {
        let raw = match self.storage.get(&self.config.items_key)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };
        Ok(decode_items(&raw))
    }

    fn write_items(&self, items: &[InventoryItem]) -> Result<()> {
        let json = serde_json::to_string(items)?;
        if let Err(e) = self.storage.set(&self.config.items_key, &json) {
            error!("Failed to store {} items: {}", items.len(), e);
            return Err(e.into());
        }
        if json.len() > self.config.size_warning_bytes {
            warn!(
                "Stored items are ~{}KB, approaching the storage limit",
                json.len() / 1024
            );
        }
        Ok(())
    }

    /// Build a new item from `draft`, put it at the head, and trim to
    /// capacity. Returns the item and the ids pushed off the tail.
    fn insert_new(
        &self,
        items: &mut Vec<InventoryItem>,
        draft: ItemDraft,
    ) -> (InventoryItem, Vec<ItemId>) {
        let now = Utc::now();
        let id = match draft.id() {
            Some(id) if !items.iter().any(|item| item.id == id) => id,
            Some(id) => {
                warn!("Item id {} already in use, assigning a new one", id);
                next_id(items, now)
            }
            None => next_id(items, now),
        };
        let item = draft.into_item(id, now, now);
        items.insert(0, item.clone());

        let evicted = if items.len() > self.config.capacity {
            items
                .split_off(self.config.capacity)
                .into_iter()
                .map(|old| old.id)
                .collect()
        } else {
            Vec::new()
        };
        (item, evicted)
    }
}

/// Decode a persisted array, recovering legacy entries where possible.
fn decode_items(raw: &str) -> Vec<InventoryItem> {
    let entries = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(entries)) => entries,
        Ok(_) => {
            warn!("Stored items was not an array, ignoring it");
            return Vec::new();
        }
        Err(e) => {
            warn!("Error parsing stored items: {}", e);
            return Vec::new();
        }
    };

    let now = Utc::now();
    let total = entries.len();
    let items: Vec<InventoryItem> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<InventoryItem>(entry.clone()) {
            Ok(item) => Some(item),
            Err(_) => serde_json::from_value::<ItemDraft>(entry)
                .ok()
                .and_then(|draft| draft.into_legacy_item(now)),
        })
        .collect();
    if items.len() < total {
        warn!("Skipped {} unreadable stored entries", total - items.len());
    }
    items
}

/// Timestamp-derived id, unique against `items`.
///
/// Ids normally climb past the largest one in use. When that one is already
/// `ItemId::MAX` the first free id from the current timestamp is taken.
fn next_id(items: &[InventoryItem], now: DateTime<Utc>) -> ItemId {
    let now_ms = now.timestamp_millis();
    let newest = items.iter().map(|item| item.id).max().unwrap_or(0);
    match newest.checked_add(1) {
        Some(after) => now_ms.max(after),
        None => {
            warn!("Largest stored id is {}, picking a free id instead", newest);
            let taken: HashSet<ItemId> = items.iter().map(|item| item.id).collect();
            (now_ms.max(1)..=ItemId::MAX)
                .find(|id| !taken.contains(id))
                .unwrap_or(now_ms)
        }
    }
}

/// Now, or just after `previous` when the clock has not moved past it.
fn advance_from(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous
            .checked_add_signed(Duration::milliseconds(1))
            .unwrap_or(previous)
    }
}
