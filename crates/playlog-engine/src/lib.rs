// Engine module - event interpretation between parsed lines and the store.
// Nothing here touches the filesystem; persistence goes through
// `ParticipantDirectory`.

pub mod grouping;
pub mod identity;
pub mod processor;

pub use grouping::{SessionBatch, SessionGrouper, SingleSession};
pub use identity::IdentityResolver;
pub use processor::{SessionOutcome, SessionProcessor};
