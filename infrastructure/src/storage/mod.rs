//! Task storage adapters implementing
//! [`TaskRepository`](dispatch_domain::TaskRepository).
//!
//! - [`InMemoryTaskRepository`] — volatile, for tests and one-shot runs
//! - [`JsonFileTaskRepository`] — JSON snapshot on disk, survives restarts
//!   and can be shared by several processes

mod json_file;
mod lock;
mod memory;
mod table;

pub use json_file::{FileStoreOptions, JsonFileTaskRepository};
pub use memory::InMemoryTaskRepository;
pub use table::{SNAPSHOT_VERSION, TaskTable};
