pub mod analysis;
pub mod cache;
pub mod detectors;
pub mod ensemble;
pub mod forecast;
pub mod knowledge;
pub mod overlay;
pub mod routes;
pub mod severity;
