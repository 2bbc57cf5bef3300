//! Nexus Files Core Domain Logic
//!
//! This crate contains:
//! - Entry registry and view projection
//! - Selection, clipboard and navigation
//! - Simulated transfer queue
//! - Application state and snapshot persistence
//! - Command system
//! - Configuration
//! - Error types

pub mod entry;
pub mod registry;
pub mod view;
pub mod selection;
pub mod clipboard;
pub mod navigation;
pub mod transfer;
pub mod simulator;
pub mod debounce;
pub mod persist;
pub mod store;
pub mod state;
pub mod config;
pub mod command;
pub mod error;

pub use entry::{Entry, EntryId, EntryKind, UploadDescriptor};
pub use registry::{EntryRegistry, DEFAULT_RECENT_LIMIT};
pub use view::{list_directory, breadcrumb, SortBy, SortOrder, TypeFilter, ViewMode, ViewSettings};
pub use selection::{Modifiers, SelectionState};
pub use clipboard::{Clipboard, ClipboardMode, ClipboardPayload};
pub use navigation::NavigationState;
pub use transfer::{Advance, TransferId, TransferQueue, TransferRecord, TransferStatus};
pub use simulator::TransferSimulator;
pub use debounce::Debouncer;
pub use persist::{KvPersistence, MemoryPersistence, Snapshot, StatePersistence};
pub use store::FileStore;
pub use state::{AppState, StoreHandle};
pub use config::{
    AppConfig, GeneralConfig, FilerConfig, TransferConfig, SearchConfig, StorageConfig,
};
pub use command::{
    Command, CommandId, CommandDispatcher, CommandParams, CommandHandler, CommandOutcome, FnHandler,
};
pub use error::{AppError, Result};
