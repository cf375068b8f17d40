mod area_allocator;
mod driver;
mod logger;
mod node;
mod node_id;
mod options;
mod score;
mod tree;

pub use area_allocator::AreaAllocator;
pub use driver::MCTSDriver;
pub use logger::{Logger, NoopLogger, WriterLogger};
pub use node::Node;
pub use node_id::NodeId;
pub use options::{MCTSOptions, RefinementOptions, TreeOptions};
pub use score::{NodeScoreAggregator, ScoreMode};
pub use tree::Tree;
