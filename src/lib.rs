pub mod access;
pub mod authz;
pub mod cli;
pub mod clock;
pub mod engine;
pub mod error;
pub mod ident;
pub mod ledger;
pub mod model;
pub mod registry;
pub mod settings;
pub mod storage;
pub mod vault;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Engine;
pub use error::{EngineError, EngineResult, FieldError};
pub use ident::{ActorId, Category, Handle, Memo, Summary, Title};
pub use model::{AccessGrant, ActivityEvent, Checksum, Entity, LogicalTime, OperationKind, Record, RecordContent, Scope, Tier};
pub use storage::{MemoryStore, TableStore};

// Test-only printing helper: expands to eprintln! during tests and is absent otherwise.
// Usage in tests: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In non-test builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        if false { let _ = format!($($arg)*); }
    });
}
