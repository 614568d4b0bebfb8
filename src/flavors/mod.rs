//! Stream flavors: the source constructors and flavor-specific hook tables
//! layered on top of [`crate::node::StreamNode`] (spec §4.4).

pub mod cold;
pub mod future;
pub mod hot;
pub mod observable;
pub mod progression;
pub mod promise;

pub use cold::Cold;
pub use future::{Future, FutureInput};
pub use hot::{HotInput, HotProducer};
pub use observable::{Observable, ObservableInput};
pub use progression::{Progress, Progression};
pub use promise::Promise;
