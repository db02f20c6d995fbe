use crate::graph::{amplify::Amplify, node::GraphNode, through::Through};

/// Fluent chaining for graph nodes: `player.through(filter).amplify(gain)`.
pub trait NodeExt: GraphNode + Sized {
    fn amplify<M: GraphNode>(self, modulator: M) -> Amplify<Self, M> {
        Amplify::new(self, modulator)
    }

    fn through<F: GraphNode>(self, processor: F) -> Through<Self, F> {
        Through::new(self, processor)
    }
}

impl<T: GraphNode> NodeExt for T {}
