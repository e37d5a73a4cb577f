// Domain layer: scan models and ports. No network or file system access here.

pub mod model;
pub mod ports;
