use serde::{Deserialize, Serialize};

use crate::item::{InventoryItem, ItemId};

/// Events emitted by the item store when its collection changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreEvent {
    Added(Box<InventoryItem>),
    Updated(Box<InventoryItem>),
    Deleted(ItemId),
    /// Pushed off the tail by an insert at capacity.
    Evicted(ItemId),
    Cleared,
}

impl StoreEvent {
    /// Id of the record the event concerns, if any.
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            StoreEvent::Added(item) | StoreEvent::Updated(item) => Some(item.id),
            StoreEvent::Deleted(id) | StoreEvent::Evicted(id) => Some(*id),
            StoreEvent::Cleared => None,
        }
    }
}
