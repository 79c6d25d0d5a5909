mod storage_backend;

pub use storage_backend::StorageBackend;
