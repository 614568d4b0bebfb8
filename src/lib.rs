//! # streamline
//!
//! A reactive dataflow engine: typed event streams composed through a small
//! set of flavors and operators.
//!
//! ## Flavors
//!
//! - **Hot** ([`flavors::HotInput`], [`flavors::HotProducer`]) — fire and
//!   forget; errors don't end the stream.
//! - **Cold** ([`flavors::Cold`]) — a definition run fresh on every
//!   `request`, with response isolation between branches.
//! - **Observable** ([`flavors::ObservableInput`]) — Hot plus an
//!   always-defined current value, replayed to late subscribers.
//! - **Future**/**Promise** ([`flavors::FutureInput`], [`flavors::Promise`])
//!   — at most one value or error over their lifetime.
//! - **Progression** ([`flavors::Progression`]) — intermediate ticks toward
//!   one final value.
//!
//! ## Quick start
//!
//! ```
//! use streamline::flavors::HotInput;
//!
//! let input: HotInput<i32, String> = HotInput::new("counter");
//! let doubled = input.stream().map(|v| v * 2);
//! input.push(21);
//! assert_eq!(doubled.last_value(), Some(42));
//! ```
//!
//! ## Composing streams
//!
//! Every operator is a method on [`node::StreamNode`] (`map`, `filter`,
//! `distinct`, `stamp`, `delay`, ...); combinators that take two streams
//! live in [`combine`] (`merge`, `zip`, `combine_latest`, `combine_progress`).
//! A derived node keeps its parent alive only as long as something is still
//! attached to it (spec invariant I5) — call [`node::StreamNode::persist`]
//! to opt a node out of that pruning.

pub mod combine;
pub mod dispatch;
pub mod either;
pub mod error;
pub mod event;
pub mod flavors;
pub mod node;
pub mod operators;
pub mod retry;
pub mod runtime;
pub mod signal;
pub mod throttle;
pub mod timer;
pub mod weak_ops;

pub use either::{Either, EitherAnd, ResultExt};
pub use error::{Result, StreamError};
pub use event::{Event, TerminationReason};
pub use node::flavor::{FlavorHooks, FlavorKind, ReplayPolicy};
pub use node::{NodeId, StreamNode};
pub use signal::{PushValue, Signal};

pub use combine::{combine_latest, combine_progress, merge, zip, zip_buffered};
pub use dispatch::{AfterDispatcher, AsyncQueueDispatcher, ChainedDispatcher, Dispatcher, InlineDispatcher, Queue, SyncQueueDispatcher, Work};
pub use retry::{RetryPolicy, RetryState};
pub use throttle::{Pressure, Stride as StrideThrottle, Throttle, ThrottleDecision, Timed as TimedThrottle, ThrottledWork};
pub use timer::{ConditionalTimer, CountingTimer, Timer};
