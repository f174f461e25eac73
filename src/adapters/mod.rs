// Adapters layer: concrete implementations of the core ports (transport, storage, sinks).

pub mod http;
pub mod sample;
pub mod sink;
pub mod storage;
