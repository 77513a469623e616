// Domain layer: models and ports. Concrete host bindings live in `adapters`.

pub mod model;
pub mod ports;
