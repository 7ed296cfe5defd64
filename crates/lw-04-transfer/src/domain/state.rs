//! Handshake states.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferState {
    Requested,
    OwnershipReassigning,
    SourceRemoving,
    DestinationNotifying,
    Accepted,
    Rejected,
}

impl TransferState {
    /// Whether the handshake has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferState::Accepted | TransferState::Rejected)
    }

    /// Allowed successor. `Rejected` is reachable from every live state.
    pub fn can_advance_to(self, next: TransferState) -> bool {
        use TransferState::*;
        match (self, next) {
            (from, Rejected) => !from.is_terminal(),
            (Requested, OwnershipReassigning)
            | (OwnershipReassigning, SourceRemoving)
            | (SourceRemoving, DestinationNotifying)
            | (DestinationNotifying, Accepted) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferState::Requested => "requested",
            TransferState::OwnershipReassigning => "ownership-reassigning",
            TransferState::SourceRemoving => "source-removing",
            TransferState::DestinationNotifying => "destination-notifying",
            TransferState::Accepted => "accepted",
            TransferState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}
