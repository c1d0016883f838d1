pub mod protocol;
pub mod registry;
pub mod room;

pub use protocol::{ClientEvent, ParticipantInfo, ServerEvent};
pub use registry::RoomRegistry;
pub use room::{HistoryEntry, Outbound, Participant, Room};
