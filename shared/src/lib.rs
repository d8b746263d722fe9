pub mod models;
pub mod utils;

// Domain models and helpers shared by the engine and any outer surface
// (notifiers, persistence, dashboards).
