//! Row expansion state.
//!
//! At most one order row is expanded at a time. Expanding is two-phase: a
//! toggle moves to `Expanding` and hands out an [`ExpandTicket`]; once the
//! row's details are available the ticket is completed to reach `Expanded`.
//! Any later transition invalidates outstanding tickets, so a detail fetch
//! that resolves after a collapse or reload cannot reopen its row.

use ops_console_core::OrderId;
use serde::Serialize;

/// Which row, if any, is open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExpansionState {
    /// No row is open.
    #[default]
    Collapsed,
    /// A row is opening; its details are being loaded.
    Expanding { order_id: OrderId },
    /// A row is open, showing one of its order items.
    Expanded {
        order_id: OrderId,
        item_index: usize,
    },
}

impl ExpansionState {
    /// The open (or opening) row.
    #[must_use]
    pub const fn order_id(&self) -> Option<&OrderId> {
        match self {
            Self::Collapsed => None,
            Self::Expanding { order_id } | Self::Expanded { order_id, .. } => Some(order_id),
        }
    }

    /// The selected item, when expanded.
    #[must_use]
    pub const fn item_index(&self) -> Option<usize> {
        match self {
            Self::Expanded { item_index, .. } => Some(*item_index),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        matches!(self, Self::Collapsed)
    }
}

/// Permission to finish expanding a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandTicket {
    order_id: OrderId,
    generation: u64,
}

impl ExpandTicket {
    /// The row this ticket opens.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }
}

/// Outcome of [`RowExpansion::begin_toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    /// The row was open and is now closed.
    Collapsed,
    /// The row is opening; load its details, then complete the ticket.
    Expanding(ExpandTicket),
}

/// Expansion controller for one order list.
#[derive(Debug, Clone, Default)]
pub struct RowExpansion {
    state: ExpansionState,
    generation: u64,
}

impl RowExpansion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &ExpansionState {
        &self.state
    }

    /// Toggle `order_id`: close it if it is open or opening, otherwise start
    /// opening it (closing any other row).
    pub fn begin_toggle(&mut self, order_id: &OrderId) -> Toggle {
        if self.state.order_id() == Some(order_id) {
            self.collapse();
            return Toggle::Collapsed;
        }

        self.generation = self.generation.wrapping_add(1);
        self.state = ExpansionState::Expanding {
            order_id: order_id.clone(),
        };
        Toggle::Expanding(ExpandTicket {
            order_id: order_id.clone(),
            generation: self.generation,
        })
    }

    /// Finish opening the ticket's row at item 0.
    ///
    /// Returns `false`, leaving the state untouched, if anything happened
    /// since the ticket was issued.
    pub fn complete(&mut self, ticket: &ExpandTicket) -> bool {
        let current = ticket.generation == self.generation
            && matches!(&self.state, ExpansionState::Expanding { order_id } if *order_id == ticket.order_id);
        if current {
            self.state = ExpansionState::Expanded {
                order_id: ticket.order_id.clone(),
                item_index: 0,
            };
        }
        current
    }

    /// Close whatever is open and invalidate outstanding tickets.
    pub fn collapse(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.state = ExpansionState::Collapsed;
    }

    /// Select the next item, stopping at the last of `item_count`.
    ///
    /// Returns the selected index, or `None` when no row is expanded.
    pub const fn next_item(&mut self, item_count: usize) -> Option<usize> {
        match &mut self.state {
            ExpansionState::Expanded { item_index, .. } => {
                if *item_index + 1 < item_count {
                    *item_index += 1;
                }
                Some(*item_index)
            }
            _ => None,
        }
    }

    /// Select the previous item, stopping at the first.
    pub const fn prev_item(&mut self) -> Option<usize> {
        match &mut self.state {
            ExpansionState::Expanded { item_index, .. } => {
                *item_index = item_index.saturating_sub(1);
                Some(*item_index)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ticket_for(expansion: &mut RowExpansion, id: &str) -> ExpandTicket {
        match expansion.begin_toggle(&OrderId::new(id)) {
            Toggle::Expanding(ticket) => ticket,
            Toggle::Collapsed => panic!("expected {id} to start expanding"),
        }
    }

    #[test]
    fn test_toggle_open_then_closed() {
        let mut expansion = RowExpansion::new();
        let ticket = ticket_for(&mut expansion, "A");
        assert_eq!(
            expansion.state(),
            &ExpansionState::Expanding {
                order_id: OrderId::new("A")
            }
        );

        assert!(expansion.complete(&ticket));
        assert_eq!(
            expansion.state(),
            &ExpansionState::Expanded {
                order_id: OrderId::new("A"),
                item_index: 0
            }
        );

        assert_eq!(expansion.begin_toggle(&OrderId::new("A")), Toggle::Collapsed);
        assert!(expansion.state().is_collapsed());
    }

    #[test]
    fn test_toggle_while_expanding_collapses() {
        let mut expansion = RowExpansion::new();
        let ticket = ticket_for(&mut expansion, "A");

        assert_eq!(expansion.begin_toggle(&OrderId::new("A")), Toggle::Collapsed);
        assert!(!expansion.complete(&ticket));
        assert!(expansion.state().is_collapsed());
    }

    #[test]
    fn test_switching_rows_invalidates_old_ticket() {
        let mut expansion = RowExpansion::new();
        let first = ticket_for(&mut expansion, "A");
        let second = ticket_for(&mut expansion, "B");

        assert!(!expansion.complete(&first));
        assert!(expansion.complete(&second));
        assert_eq!(expansion.state().order_id(), Some(&OrderId::new("B")));
    }

    #[test]
    fn test_stale_ticket_after_reopen() {
        // Open, close and reopen A: only the newest ticket may complete.
        let mut expansion = RowExpansion::new();
        let stale = ticket_for(&mut expansion, "A");
        expansion.begin_toggle(&OrderId::new("A"));
        let fresh = ticket_for(&mut expansion, "A");

        assert!(!expansion.complete(&stale));
        assert!(expansion.complete(&fresh));
    }

    #[test]
    fn test_item_navigation_clamps() {
        let mut expansion = RowExpansion::new();
        let ticket = ticket_for(&mut expansion, "A");
        expansion.complete(&ticket);

        assert_eq!(expansion.prev_item(), Some(0));
        assert_eq!(expansion.next_item(3), Some(1));
        assert_eq!(expansion.next_item(3), Some(2));
        assert_eq!(expansion.next_item(3), Some(2));
        assert_eq!(expansion.prev_item(), Some(1));
    }

    #[test]
    fn test_item_navigation_without_items() {
        let mut expansion = RowExpansion::new();
        assert_eq!(expansion.next_item(3), None);

        let ticket = ticket_for(&mut expansion, "A");
        assert_eq!(expansion.next_item(3), None);

        expansion.complete(&ticket);
        assert_eq!(expansion.next_item(0), Some(0));
    }
}
