// Domain layer: core models and ports (interfaces) the provisioning loop is written against.

pub mod model;
pub mod ports;
