use serde::{Deserialize, Serialize};

use super::task::ExplorationTask;

/// Tasks created from the same prompt-queue snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layer {
    pub tasks: Vec<ExplorationTask>,
}

impl Layer {
    pub fn new(tasks: Vec<ExplorationTask>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// The full exploration result: layers in the order they were run.
///
/// Layer `n + 1` holds the tasks spawned by follow-up prompts from
/// layer `n`. Length never exceeds the configured max depth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskTree {
    pub layers: Vec<Layer>,
}

impl TaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn total_tasks(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
