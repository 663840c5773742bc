//! Profiles and their on-disk storage
//!
//! - **button**: ButtonDefinition, the persisted attributes of one button
//! - **profile**: Profile, an ordered list of definitions keyed by ButtonId
//! - **store**: ConfigStore, one JSON file per profile plus the preferences record

pub mod button;
pub mod preferences;
pub mod profile;
pub mod store;

pub use button::{ButtonDefinition, ButtonId};
pub use preferences::Preferences;
pub use profile::Profile;
pub use store::ConfigStore;
