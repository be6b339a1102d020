mod store;
mod redis_service;
mod memory_store;
mod auth_service;
mod task_service;
mod reference_service;
pub mod seed;

pub use store::Store;
pub use redis_service::RedisService;
pub use memory_store::MemoryStore;
pub use auth_service::AuthService;
pub use task_service::TaskService;
pub use reference_service::ReferenceService;
