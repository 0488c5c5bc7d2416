// Adapters layer: concrete implementations of the domain ports (carrier HTTP API, storage).

pub mod storage;
pub mod twilio;
