// Library exports for chartprep

pub mod client;
pub mod dispatch;
pub mod inspect;
pub mod parser;
pub mod pie;
pub mod pivot;
pub mod remap;
pub mod rows;
pub mod settings;

pub use dispatch::{evaluate, ChartInput, ChartState};
pub use inspect::{ChartType, SeriesConfig};
pub use parser::{parse_chart_spec, ChartSpec};
pub use pivot::Aggregation;
pub use rows::Row;
