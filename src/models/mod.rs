pub mod admission;
pub mod diagnosis;
pub mod enums;
pub mod note_event;
pub mod patient;
pub mod procedure;

pub use admission::*;
pub use diagnosis::*;
pub use note_event::*;
pub use patient::*;
pub use procedure::*;
