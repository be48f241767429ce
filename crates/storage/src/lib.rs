#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    ActivityRepository, AppendOutcome, CompletionRepository, InMemoryRepository,
    PositionRepository, Storage, StorageError,
};
