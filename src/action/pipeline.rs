//! Stages and the pipelines that chain them.
//!
//! A pipeline is an onion: each stage receives a [`Next`] continuation,
//! may do work before calling it, and may do more work after it returns.
//! When an inner stage fails, the error travels back out through every
//! stage that was entered, so their after-logic still runs.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::action::ActionContext;
use crate::error::{HangarError, Result};

/// One link in a pipeline.
pub trait Stage: Send + Sync {
    /// Name used in logs and in pipeline errors.
    fn name(&self) -> &str;

    /// Run this stage. Call `next.call(ctx)` to run the stages nested inside.
    fn call(&self, ctx: &mut ActionContext, next: Next<'_>) -> Result<()>;
}

/// The rest of the pipeline, from the point of view of one stage.
///
/// Consumed by [`call`](Next::call), so a stage can proceed at most once.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Stage>],
}

impl<'a> Next<'a> {
    /// Run the remaining stages.
    ///
    /// An error from a stage that has not been attributed yet is wrapped in
    /// `StageFailed` with that stage's name; errors already attributed by
    /// a deeper stage pass through unchanged.
    pub fn call(self, ctx: &mut ActionContext) -> Result<()> {
        let Some((stage, rest)) = self.rest.split_first() else {
            return Ok(());
        };

        trace!("Entering stage {}", stage.name());
        let result = stage.call(ctx, Next { rest });
        trace!("Leaving stage {}", stage.name());

        result.map_err(|err| match err {
            tagged @ HangarError::StageFailed { .. } => tagged,
            other => HangarError::StageFailed {
                stage: stage.name().to_string(),
                source: Box::new(other),
            },
        })
    }

    /// Number of stages still to run.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}

/// An ordered list of stages, fixed once built.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn stage(self, stage: impl Stage + 'static) -> Self {
        self.stage_arc(Arc::new(stage))
    }

    /// Append a shared stage.
    pub fn stage_arc(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append a closure as a stage.
    pub fn stage_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut ActionContext, Next<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.stage(FnStage {
            name: name.into(),
            f,
        })
    }

    /// Append every stage of `other`, nested inside the stages already here.
    pub fn append(mut self, other: Pipeline) -> Self {
        self.stages.extend(other.stages);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names, outermost first.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// A continuation positioned before the outermost stage.
    pub(crate) fn start(&self) -> Next<'_> {
        Next { rest: &self.stages }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

struct FnStage<F> {
    name: String,
    f: F,
}

impl<F> Stage for FnStage<F>
where
    F: Fn(&mut ActionContext, Next<'_>) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, ctx: &mut ActionContext, next: Next<'_>) -> Result<()> {
        (self.f)(ctx, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(log: &Log, name: &'static str) -> impl Fn(&mut ActionContext, Next<'_>) -> Result<()> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |ctx, next| {
            log.lock().unwrap().push(format!("{}:in", name));
            let result = next.call(ctx);
            log.lock().unwrap().push(format!("{}:out", name));
            result
        }
    }

    #[test]
    fn stages_wrap_in_registration_order() {
        let log: Log = Arc::default();
        let pipeline = Pipeline::new()
            .stage_fn("a", recording(&log, "a"))
            .stage_fn("b", recording(&log, "b"));

        pipeline.start().call(&mut ActionContext::new()).unwrap();

        assert_eq!(*log.lock().unwrap(), ["a:in", "b:in", "b:out", "a:out"]);
    }

    #[test]
    fn failure_is_tagged_with_innermost_stage() {
        let log: Log = Arc::default();
        let pipeline = Pipeline::new()
            .stage_fn("outer", recording(&log, "outer"))
            .stage_fn("inner", |_, _| {
                Err(HangarError::Other(anyhow::anyhow!("disk full")))
            });

        let err = pipeline.start().call(&mut ActionContext::new()).unwrap_err();

        match err {
            HangarError::StageFailed { stage, source } => {
                assert_eq!(stage, "inner");
                assert!(source.to_string().contains("disk full"));
            }
            other => panic!("expected StageFailed, got {:?}", other),
        }
        assert_eq!(*log.lock().unwrap(), ["outer:in", "outer:out"]);
    }

    #[test]
    fn stage_may_stop_the_chain() {
        let log: Log = Arc::default();
        let pipeline = Pipeline::new()
            .stage_fn("gate", |_, _| Ok(()))
            .stage_fn("never", recording(&log, "never"));

        pipeline.start().call(&mut ActionContext::new()).unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn append_nests_other_pipeline_inside() {
        let first = Pipeline::new().stage_fn("a", |c, n| n.call(c));
        let second = Pipeline::new()
            .stage_fn("b", |c, n| n.call(c))
            .stage_fn("c", |c, n| n.call(c));

        let combined = first.append(second);
        assert_eq!(combined.stage_names(), ["a", "b", "c"]);
        assert_eq!(combined.len(), 3);
    }

    #[test]
    fn next_reports_remaining_stages() {
        let pipeline = Pipeline::new()
            .stage_fn("a", |ctx, next| {
                ctx.insert("remaining", next.remaining());
                next.call(ctx)
            })
            .stage_fn("b", |c, n| n.call(c));

        let mut ctx = ActionContext::new();
        pipeline.start().call(&mut ctx).unwrap();
        assert_eq!(ctx.get::<usize>("remaining"), Some(&1));
    }

    #[test]
    fn empty_pipeline_succeeds() {
        let pipeline = Pipeline::new();
        assert!(pipeline.is_empty());
        pipeline.start().call(&mut ActionContext::new()).unwrap();
    }
}
