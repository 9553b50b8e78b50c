// Domain layer: request-scoped records and ports (interfaces). No HTTP types here.

pub mod model;
pub mod ports;
