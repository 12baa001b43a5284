//! Actor state tracking and reconciliation against a live host.
//!
//! The engine sits between a host that displays actors and the users and
//! automation that want those actors to look different:
//! - [`StateManager`] owns one [`state::ActorState`] per tracked actor and is
//!   the only write path for model changes
//! - [`StateListener`] intercepts values the host is about to display and
//!   either lets them through or rewrites them to the model
//! - [`StateApplier`] turns model fields into the cheapest host effects
//! - [`Host`] and [`Catalog`] are the adapters a host integration implements
//!
//! # Design Principles
//!
//! - **Single threaded** - Every entry point runs on the host's update thread.
//! - **Host effects through one door** - Only the applier calls effect methods.
//! - **Transient disguises never stick** - Values the host shows for a
//!   transformation are never absorbed into base.
//!
//! # Example
//!
//! ```ignore
//! let mut manager = StateManager::new(EngineConfig::default(), catalog);
//! manager.get_or_create(&host, actor)?;
//! manager.change_stain(&mut host, actor, EquipSlot::Body, StainId(3), EditContext::manual())?;
//! ```

mod applier;
mod config;
mod deferred;
mod design;
mod events;
mod host;
mod listener;
mod manager;

pub use applier::StateApplier;
pub use config::EngineConfig;
pub use deferred::{DeferredAction, DeferredQueue};
pub use design::Design;
pub use events::{ChangeKind, EventBus, StateEvent, SubscriptionId};
pub use host::{Catalog, Host, HostSample};
pub use listener::{classify, Created, ListenerStats, Resolution, StateListener, UpdateState};
pub use manager::StateManager;

#[cfg(feature = "serde")]
pub use design::mask_names;
