pub mod cancel;
pub mod client;
pub mod error;
pub mod index;
pub mod linker;
pub mod matching;
pub mod poller;
pub mod store;
pub mod tagging;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use cancel::CancelSignal;
pub use client::GraphClient;
pub use error::LinkError;
pub use linker::{LinkReport, Linker};
pub use matching::BatchStats;
pub use poller::{IndexState, IndexStatus};
pub use store::{IndexCreation, LinkStore};

pub use neo4rs::query;
