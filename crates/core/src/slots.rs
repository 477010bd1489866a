//! Client-side ordering and progressive reveal of a slot list.
//!
//! The API makes no promise about slot order, so this ordering is the only one the user sees.
//! Sorting is stable: slots that compare equal keep the order the server sent them in, in both
//! directions.

use crate::constants::SLOT_PAGE_SIZE;
use fhir::SlotData;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// By `start` instant.
    Date,
    /// Free slots first, then by status text.
    Status,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" | "time" | "start" => Ok(SortKey::Date),
            "status" => Ok(SortKey::Status),
            other => Err(format!("unknown sort key '{other}', expected 'date' or 'status'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Current sort key and direction. Starts on date, ascending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            key: SortKey::Date,
            direction: SortDirection::Asc,
        }
    }
}

impl SortOrder {
    /// Choosing the current key flips direction; choosing another key resets to ascending.
    pub fn choose(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn compare(&self, a: &SlotData, b: &SlotData) -> Ordering {
        match self.key {
            SortKey::Date => self.direction.apply(a.start.cmp(&b.start)),
            SortKey::Status => match (a.is_free(), b.is_free()) {
                // Free slots lead whatever the direction.
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => self
                    .direction
                    .apply(a.status.as_str().cmp(b.status.as_str())),
            },
        }
    }
}

/// Stable in-place sort of `slots` by `order`.
pub fn sort_slots(slots: &mut [SlotData], order: SortOrder) {
    slots.sort_by(|a, b| order.compare(a, b));
}

/// Which reveal control is offered. Exactly one is offered at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageControl {
    ShowMore,
    ShowLess,
}

/// Number of slots revealed so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    visible: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            visible: SLOT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn visible(&self) -> usize {
        self.visible
    }

    pub fn show_more(&mut self) {
        self.visible += SLOT_PAGE_SIZE;
    }

    pub fn show_less(&mut self) {
        self.visible = SLOT_PAGE_SIZE;
    }

    pub fn control(&self, total: usize) -> PageControl {
        if self.visible < total {
            PageControl::ShowMore
        } else {
            PageControl::ShowLess
        }
    }

    /// The revealed prefix of `items`.
    pub fn page<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.visible.min(items.len())]
    }
}
