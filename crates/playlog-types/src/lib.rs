pub mod delta;
pub mod directory;
pub mod event;
pub mod line;
pub mod participant;
pub mod stats;

pub use delta::SessionDelta;
pub use directory::{Allocation, MemoryDirectory, ParticipantDirectory, allocate};
pub use event::Event;
pub use line::LogLine;
pub use participant::{AccountEntry, ParticipantId, ParticipantRecord, PlaytimeEntry};
