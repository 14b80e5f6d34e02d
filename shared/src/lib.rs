pub mod events;
pub mod report;
pub mod status;
pub mod uptime;

pub use events::StatusEvent;
pub use report::*;
pub use status::*;
pub use uptime::format_uptime;
