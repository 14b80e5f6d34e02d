pub mod status_cache;
pub mod status_protocol;
