//! Lifecycle pipelines.
//!
//! Every lifecycle operation (up, halt, destroy, ...) is a [`Pipeline`] of
//! [`Stage`]s run by an [`ActionRunner`] against a fresh [`ActionContext`].
//!
//! # Example
//!
//! ```
//! use hangar::action::{ActionContext, ActionRunner, Pipeline};
//!
//! let pipeline = Pipeline::new()
//!     .stage_fn("lock", |ctx, next| {
//!         ctx.insert("locked", true);
//!         let result = next.call(ctx);
//!         ctx.insert("locked", false);
//!         result
//!     })
//!     .stage_fn("boot", |ctx, next| {
//!         assert_eq!(ctx.get::<bool>("locked"), Some(&true));
//!         next.call(ctx)
//!     });
//!
//! let ctx = ActionRunner::empty()
//!     .run(&pipeline, ActionContext::new())
//!     .unwrap();
//! assert_eq!(ctx.get::<bool>("locked"), Some(&false));
//! ```

pub mod builtin;
pub mod context;
pub mod pipeline;
pub mod runner;

pub use builtin::{EnvSet, Message, Timed};
pub use context::{keys, ActionContext};
pub use pipeline::{Next, Pipeline, Stage};
pub use runner::ActionRunner;
