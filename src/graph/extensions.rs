use crate::graph::{
    amplify::Amplify,
    modulate::Modulate,
    node::{GraphNode, Modulatable},
    through::Through,
};

/// Fluent combinators, available on every node.
pub trait NodeExt: GraphNode + Sized {
    fn amplify<M: GraphNode>(self, modulator: M) -> Amplify<Self, M> {
        Amplify::new(self, modulator)
    }

    fn through<F: GraphNode>(self, effect: F) -> Through<Self, F> {
        Through::new(self, effect)
    }

    fn modulate<L: GraphNode>(self, lfo: L, param: Self::Param, depth: f32) -> Modulate<Self, L>
    where
        Self: Modulatable,
    {
        Modulate::new(self, lfo, param, depth)
    }

    fn boxed(self) -> Box<dyn GraphNode>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T: GraphNode> NodeExt for T {}
