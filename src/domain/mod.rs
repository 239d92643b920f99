// Domain layer: record model, field edit document and ports to the store and local files.

pub mod field_edits;
pub mod model;
pub mod ports;
