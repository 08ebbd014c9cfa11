pub mod firestore;
pub mod interface;
pub mod memory;

pub use firestore::FirestoreClient;
pub use interface::{
    CreatedDocument, DocumentId, NewsStore, Snapshot, StoreError, Subscription, PREFIX_SENTINEL,
};
pub use memory::MemoryStore;
