use compact_str::CompactString;
use smallvec::SmallVec;

pub mod node;

/// A program is an ordered list of statements; it is produced by an external
/// parse-tree transformer and consumed by both the optimizer and the
/// evaluator.
pub type Program = Vec<node::Stmt>;
pub type IdentName = CompactString;
pub type Params = SmallVec<[node::Ident; 4]>;
