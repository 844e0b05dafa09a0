//! Directed pipelines of agents.
//!
//! An edge means "feed the producer's full text output to the consumer as a
//! single user message". Nodes execute strictly sequentially in the
//! topological order fixed at build time; there is no fan-out or fan-in.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;

use crate::agent::Agent;
use crate::errors::PipelineError;
use crate::models::message::Message;
use crate::models::thread::Thread;

/// An event produced during a streaming pipeline run. Ephemeral; not
/// persisted anywhere.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A text fragment from one node, tagged with a run-global sequence
    /// number that increases strictly monotonically.
    Fragment {
        node: String,
        sequence: u64,
        text: String,
    },
    /// Terminal marker for a node: its stream is complete and `output` is its
    /// full text. Always emitted before the next node produces anything.
    NodeComplete { node: String, output: String },
}

#[derive(Default)]
pub struct PipelineBuilder {
    nodes: Vec<Arc<Agent>>,
    edges: Vec<(String, String)>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(mut self, agent: Agent) -> Self {
        self.nodes.push(Arc::new(agent));
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Validate the graph and fix the execution order.
    ///
    /// The graph must be non-empty, node names unique, every edge endpoint
    /// known, and the edges acyclic. A finite acyclic graph always has a
    /// zero-in-degree entry and every node is reachable from one, so no
    /// separate connectivity check is needed.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        if self.nodes.is_empty() {
            return Err(PipelineError::InvalidGraph(
                "pipeline has no nodes".to_string(),
            ));
        }

        let mut index_of = HashMap::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if index_of.insert(node.name().to_string(), index).is_some() {
                return Err(PipelineError::InvalidGraph(format!(
                    "duplicate node name: {}",
                    node.name()
                )));
            }
        }

        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        let mut in_degree: Vec<usize> = vec![0; self.nodes.len()];
        for (from, to) in &self.edges {
            let from = *index_of.get(from).ok_or_else(|| {
                PipelineError::InvalidGraph(format!("edge references unknown node: {}", from))
            })?;
            let to = *index_of.get(to).ok_or_else(|| {
                PipelineError::InvalidGraph(format!("edge references unknown node: {}", to))
            })?;
            outgoing[from].push(to);
            in_degree[to] += 1;
        }

        // Kahn's algorithm; anything left over sits on a cycle
        let mut ready: Vec<usize> = (0..self.nodes.len())
            .filter(|&index| in_degree[index] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(index) = ready.pop() {
            order.push(self.nodes[index].clone());
            for &next in &outgoing[index] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(next);
                }
            }
        }
        if order.len() != self.nodes.len() {
            return Err(PipelineError::InvalidGraph(
                "graph contains a cycle".to_string(),
            ));
        }

        Ok(Pipeline { order })
    }
}

pub struct Pipeline {
    order: Vec<Arc<Agent>>,
}

impl Pipeline {
    /// Node names in execution order
    pub fn node_names(&self) -> Vec<&str> {
        self.order.iter().map(|agent| agent.name()).collect()
    }

    /// Run the pipeline to completion and return the last node's message.
    ///
    /// The first node receives the initial text unchanged; every later node
    /// receives exactly the previous node's full text output as a single
    /// user message in a fresh thread.
    pub async fn run(&self, initial: &str) -> Result<Message, PipelineError> {
        let mut input = initial.to_string();
        let mut last = None;

        for agent in &self.order {
            let mut thread = Thread::new();
            thread.push(Message::user().with_text(&input));
            let response = agent.run(&thread).await?;
            input = response.text();
            last = Some(response);
        }

        // build() guarantees at least one node
        last.ok_or_else(|| PipelineError::InvalidGraph("pipeline has no nodes".to_string()))
    }

    /// Run the pipeline, relaying each node's fragments as they arrive.
    ///
    /// Execution is strictly sequential: the next node starts only after the
    /// current node's `NodeComplete` marker. Dropping the stream abandons the
    /// in-flight request.
    pub fn run_streaming(&self, initial: &str) -> BoxStream<'_, Result<PipelineEvent, PipelineError>> {
        let initial = initial.to_string();

        Box::pin(async_stream::try_stream! {
            let mut input = initial;
            let mut sequence: u64 = 0;

            for agent in &self.order {
                let mut thread = Thread::new();
                thread.push(Message::user().with_text(&input));

                let mut output = String::new();
                let mut stream = agent.run_streaming(&thread).await?;
                while let Some(fragment) = stream.next().await {
                    let fragment = fragment?;
                    output.push_str(&fragment);
                    yield PipelineEvent::Fragment {
                        node: agent.name().to_string(),
                        sequence,
                        text: fragment,
                    };
                    sequence += 1;
                }
                drop(stream);

                yield PipelineEvent::NodeComplete {
                    node: agent.name().to_string(),
                    output: output.clone(),
                };
                input = output;
            }
        })
    }
}
