//! `carecircle-events` — session change notification.
//!
//! Two delivery mechanisms live here, with deliberately different semantics:
//!
//! - [`SessionBus`]: synchronous in-process observer bus. `publish` runs
//!   every current subscriber on the calling turn before returning.
//! - [`CrossContextChannel`]: queued delivery between browsing contexts
//!   (tabs/windows over one durable store). Asynchronous by nature; a
//!   watcher only observes the change when it next drains its queue.

pub mod bus;
pub mod external;
pub mod topic;

pub use bus::{BusError, SessionBus, Subscription};
pub use external::{ChannelError, ContextId, ContextWatcher, CrossContextChannel};
pub use topic::{Notice, Topic};
