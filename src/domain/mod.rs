// Domain layer: plain configuration records, lookup results and the ports
// (interfaces) the engine talks to. No behavior is specialised per country.

pub mod model;
pub mod ports;
