mod fetch;
mod model;
mod records;

pub use fetch::{DataSource, Endpoints, Payload, ViewRequest, fetch};
pub use model::{Graph, LinkIndex, NodeIndex, RelationFilter};
pub use records::{BubbleRecord, RawGraph};
