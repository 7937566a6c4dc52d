//! # lib-profile
//!
//! Per-station resistivity profiles for geoelectric field derivation.
//!
//! - [`table`]: `nom` parser for `res_model_<STATION>.txt` tables
//! - [`store`]: search-path lookup of those tables by station code

pub mod error;
pub mod store;
pub mod table;

pub use error::ProfileError;
pub use store::{default_dirs, ProfileStore};
pub use table::{parse_profile, parse_profile_file};
