//! Frame graph: pass dependency ordering for one frame.

use crate::config::LightingToggles;
use crate::error::{RsmError, RsmResult};

/// GPU passes of a frame. Buffer resizing happens on the host before any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePass {
    ClearOutput,
    Rsm,
    GBuffer,
    DirectLighting,
    IndirectLighting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Default)]
pub struct FrameGraph {
    nodes: Vec<FramePass>,
    edges: Vec<(NodeId, NodeId)>,
}

impl FrameGraph {
    pub fn new() -> Self { Self::default() }

    pub fn add_node(&mut self, pass: FramePass) -> NodeId {
        self.nodes.push(pass);
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_edge(&mut self, before: NodeId, after: NodeId) { self.edges.push((before, after)); }

    /// The frame's passes and their data dependencies:
    /// scene writers before both resolvers, the cleared output before whichever resolver
    /// writes first, and direct before indirect (indirect blends onto direct's result).
    /// The two scene writers do not depend on each other.
    pub fn standard(lighting: LightingToggles) -> Self {
        let mut graph = Self::new();
        let clear = graph.add_node(FramePass::ClearOutput);
        let rsm = graph.add_node(FramePass::Rsm);
        let gbuffer = graph.add_node(FramePass::GBuffer);
        let direct = lighting.direct.then(|| graph.add_node(FramePass::DirectLighting));
        let indirect = lighting.indirect.then(|| graph.add_node(FramePass::IndirectLighting));
        for resolver in [direct, indirect].into_iter().flatten() {
            graph.add_edge(clear, resolver);
            graph.add_edge(rsm, resolver);
            graph.add_edge(gbuffer, resolver);
        }
        if let (Some(direct), Some(indirect)) = (direct, indirect) {
            graph.add_edge(direct, indirect);
        }
        graph
    }

    /// Topological order. Among ready passes the earliest-added goes first, so the order is
    /// stable from frame to frame.
    pub fn topological_order(&self) -> RsmResult<Vec<FramePass>> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        let mut out_edges: Vec<Vec<usize>> = vec![Vec::new(); n];
        for &(NodeId(a), NodeId(b)) in &self.edges {
            if a >= n || b >= n {
                return Err(RsmError::Schedule(format!("edge {a} -> {b} references a missing pass")));
            }
            in_degree[b] += 1;
            out_edges[a].push(b);
        }
        let mut ready: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(pos) = ready.iter().copied().enumerate().min_by_key(|&(_, i)| i).map(|(pos, _)| pos) {
            let u = ready.swap_remove(pos);
            order.push(self.nodes[u]);
            for &v in &out_edges[u] {
                in_degree[v] -= 1;
                if in_degree[v] == 0 { ready.push(v); }
            }
        }
        if order.len() != n {
            return Err(RsmError::Schedule("frame graph has a cycle".to_string()));
        }
        Ok(order)
    }
}
