//! Order status state machine
//!
//! `NEW -> PREPARING -> READY -> SERVED`, with `NEW -> CANCELLED` and
//! `(any non-terminal) -> PAID`. `PAID` and `CANCELLED` are terminal.

use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    Preparing,
    Ready,
    Served,
    Paid,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }

    /// Statuses that count toward a table's running total and its
    /// occupied flag.
    pub fn is_billable(self) -> bool {
        !self.is_terminal()
    }

    /// The complete transition table.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, to) {
            (New, Preparing) | (New, Cancelled) | (New, Paid) => true,
            (Preparing, Ready) | (Preparing, Paid) => true,
            (Ready, Served) | (Ready, Paid) => true,
            (Served, Paid) => true,
            _ => false,
        }
    }

    /// All states reachable in one transition.
    pub fn allowed_next(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            New => &[Preparing, Cancelled, Paid],
            Preparing => &[Ready, Paid],
            Ready => &[Served, Paid],
            Served => &[Paid],
            Paid | Cancelled => &[],
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::New => write!(f, "NEW"),
            OrderStatus::Preparing => write!(f, "PREPARING"),
            OrderStatus::Ready => write!(f, "READY"),
            OrderStatus::Served => write!(f, "SERVED"),
            OrderStatus::Paid => write!(f, "PAID"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}
