// Domain layer: reservation models and the collaborator traits the core is written against.

pub mod model;
pub mod ports;
