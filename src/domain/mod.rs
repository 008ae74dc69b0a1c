// Domain layer: account records, output rows and the ports the engine depends on.

pub mod model;
pub mod ports;
