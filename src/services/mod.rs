mod bucket_reconciler;
mod storage_service_impl;

pub use bucket_reconciler::{BucketOutcome, BucketReconciler, ReconcileAction, ReconcileReport};
pub use storage_service_impl::StorageService;
