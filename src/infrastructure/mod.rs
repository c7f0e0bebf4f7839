pub mod cbor;
pub mod logging;
pub mod seed_source;
