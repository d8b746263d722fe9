// Engine-side models. Wire/persistence models live in `shared::models`.
pub mod series;

pub use series::PriceSeries;
