#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! tsbundle core: module graph scanning, linking and everything they need
//! (file access, resolution, diagnostics, configuration).

pub mod bundler;
pub mod config;
pub mod error;
pub mod fs;
pub mod log;
pub mod paths;
pub mod version;

pub use config::{BundleConfig, Config};
pub use error::Error;
pub use version::{BuildInfo, VERSION};
