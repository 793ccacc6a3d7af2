//! Topic graph: nodes, documents, and curation edges (spec §3).

pub mod graph;
pub mod node;

pub use graph::TopicGraph;
pub use node::{ContentLocation, DocChunk, DocChunkOrigin, DocumentationNode, NodeKind, SymbolPayload, TopicGraphNode};
