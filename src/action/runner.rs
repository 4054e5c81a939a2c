//! Runs pipelines against a fresh context.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::action::{ActionContext, Pipeline};
use crate::error::{HangarError, PipelineError, Result};

type Seed = Arc<dyn Fn() -> ActionContext + Send + Sync>;

/// Entry point for every lifecycle operation.
///
/// Cheap to clone; clones share the same seed.
#[derive(Clone)]
pub struct ActionRunner {
    seed: Seed,
}

impl ActionRunner {
    /// A runner whose contexts start from whatever `seed` returns.
    pub fn new(seed: impl Fn() -> ActionContext + Send + Sync + 'static) -> Self {
        Self {
            seed: Arc::new(seed),
        }
    }

    /// A runner whose contexts start empty.
    pub fn empty() -> Self {
        Self::new(ActionContext::new)
    }

    /// Run `pipeline` with a new context.
    ///
    /// The context is seeded with the runner defaults and then `extra`,
    /// whose values win on conflicting keys. On success the final context
    /// is returned.
    ///
    /// # Errors
    ///
    /// A stage failure is returned as [`HangarError::Pipeline`] once every
    /// entered stage has unwound, with the failing stage's name and the
    /// context as it stood at that point.
    pub fn run(&self, pipeline: &Pipeline, extra: ActionContext) -> Result<ActionContext> {
        let mut ctx = (self.seed)();
        ctx.extend(extra);

        debug!("Running pipeline {:?}", pipeline.stage_names());
        match pipeline.start().call(&mut ctx) {
            Ok(()) => Ok(ctx),
            Err(HangarError::StageFailed { stage, source }) => {
                warn!("Pipeline failed in stage '{}': {}", stage, source);
                Err(HangarError::Pipeline(Box::new(PipelineError {
                    stage,
                    source: *source,
                    context: ctx,
                })))
            }
            Err(other) => Err(other),
        }
    }
}

impl std::fmt::Debug for ActionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRunner").finish_non_exhaustive()
    }
}
