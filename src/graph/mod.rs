/// Traversal plan and Cypher statement rendering.
pub mod statement;

/// Row-to-concept assembly with concordance precedence.
pub mod assembler;

/// `ConceptSource` backed by a Cypher-speaking graph store.
pub mod driver;

pub use assembler::{assemble, NeoConcept, NeoNode, NeoThing, NodeSource};
pub use driver::CypherDriver;
pub use statement::{build_statement, CypherStatement, TraversalPlan, TraversalStep};
