pub mod domain;
pub mod ports;

pub use domain::{NewSavedItem, ProgressRecord, SavedItem, VideoResult};
pub use ports::{DatabaseService, PortError, PortResult, VideoSearchService};
