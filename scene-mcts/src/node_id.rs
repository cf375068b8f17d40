/// Stable, arena-local handle to a [`Node`](crate::Node).
///
/// Parent links are stored as `Option<NodeId>` rather than a borrowed or
/// reference-counted pointer, so a node never extends its parent's lifetime —
/// the whole tree is owned by a single [`AreaAllocator`](crate::AreaAllocator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);
