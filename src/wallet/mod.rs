/// Capability interface of the external wallet engine
pub mod engine;
/// Session task serializing commands against engine events
pub mod session;
pub mod sync;
pub mod types;

pub use engine::{EngineEvent, OpenRequest, WalletEngine};
pub use session::{SessionHandle, SessionStatus, WalletSession};
pub use sync::{SessionConfig, SessionObserver, SyncOrchestrator};
pub use types::*;
