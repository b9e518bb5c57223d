pub mod bundle;
pub mod version;
