mod car_catalog;
mod engine;
mod error;
mod types;

pub use car_catalog::CarCatalog;
pub use engine::{Engine, EngineOptions, Session, average_ranking};
pub use error::{CoreError, CoreErrorCode};
pub use types::{
    ArcadeEntry, CarEntry, CarFieldValue, CareerProgress, LicenseEntry, ScalarEntry, SlotSnapshot,
    SlotSummary,
};
