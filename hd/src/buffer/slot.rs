//! Buffer slot: a work item or the termination token

use serde::Serialize;

/// One entry in the buffer
///
/// The termination token is its own variant rather than a reserved payload
/// value, so it can never be confused with real data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot<T> {
    /// A payload produced from the source feed
    Item(T),
    /// "No more input" from one producer
    Termination,
}

impl<T> Slot<T> {
    /// Check if this slot is the termination token
    pub fn is_termination(&self) -> bool {
        matches!(self, Slot::Termination)
    }

    /// Take the payload out, if there is one
    pub fn into_item(self) -> Option<T> {
        match self {
            Slot::Item(item) => Some(item),
            Slot::Termination => None,
        }
    }
}

impl<T> From<T> for Slot<T> {
    fn from(item: T) -> Self {
        Slot::Item(item)
    }
}
