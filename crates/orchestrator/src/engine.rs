//! Breadth-first layer scheduler over the task pipeline.

use std::collections::VecDeque;
use std::sync::Arc;

use datadrill_core::{Layer, TaskTree};
use futures::future::join_all;
use sandbox::CodeExecutor;
use tracing::{info, warn};

use crate::collector::OutputCollector;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::task_runner::{AgentSet, TaskRunner};

/// Owns the prompt queue and the layer-by-layer fan-out policy.
///
/// Tasks within a layer share no mutable state and run concurrently;
/// layers are strictly sequential because layer `n + 1`'s prompts are
/// not known until every task of layer `n` has been collected.
pub struct Orchestrator {
    runner: TaskRunner,
    collector: OutputCollector,
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(agents: AgentSet, executor: Arc<dyn CodeExecutor>, config: EngineConfig) -> Self {
        let runner = TaskRunner::new(agents, executor, config.clone());
        let collector = OutputCollector::new(config.output_format);
        Self {
            runner,
            collector,
            config,
        }
    }

    /// Grow the task tree from the seed prompts.
    ///
    /// Follow-up prompts are enqueued in task order then extraction
    /// order, so the same task outputs always reproduce the same tree.
    pub async fn run(&self, seed_prompts: Vec<String>) -> Result<TaskTree> {
        self.config.validate()?;

        let mut tree = TaskTree::new();
        let mut queue: VecDeque<String> = seed_prompts.into();

        for depth in 0..self.config.max_depth {
            // Blank prompts are filtered, not errors.
            let prompts: Vec<String> = queue
                .drain(..)
                .filter(|prompt| !prompt.trim().is_empty())
                .collect();

            if prompts.is_empty() {
                info!(depth, "Prompt queue exhausted, stopping early");
                break;
            }

            info!(depth, task_count = prompts.len(), "Running layer");

            let mut tasks = join_all(
                prompts
                    .into_iter()
                    .map(|prompt| self.runner.run(prompt)),
            )
            .await;

            for task in &mut tasks {
                match self.collector.collect(task) {
                    Ok(output) => queue.extend(output.follow_up_prompts),
                    Err(e) => {
                        warn!(task_id = %task.id, error = %e, "Output collection failed");
                        task.mark_failed(format!("collect: {e}"));
                    }
                }
            }

            let failed = tasks.iter().filter(|task| task.is_failed()).count();
            info!(
                depth,
                completed = tasks.len() - failed,
                failed,
                queued = queue.len(),
                "Layer finished"
            );

            tree.push_layer(Layer::new(tasks));

            // No instruct stages ran, so nothing was queued and nothing
            // ever will be.
            if self.config.branching_factor == 0 {
                break;
            }
        }

        info!(
            layers = tree.depth(),
            tasks = tree.total_tasks(),
            "Exploration finished"
        );
        Ok(tree)
    }
}
