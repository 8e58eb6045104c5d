pub mod memory;
pub mod redis;
pub mod state;
pub mod store;

pub use memory::MemoryStore;
pub use redis::{create_redis_client, RedisStore, StoreWriterHandle};
pub use state::SequencerStore;
pub use store::{PersistentStore, StoreKey};
