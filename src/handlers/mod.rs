mod auth;
mod task;
mod reference;
mod resources;

pub use auth::{handle_register, handle_login, current_user, handle_logout};
pub use task::{list_tasks, create_task, update_task, delete_task};
pub use reference::{list_priorities, list_difficulties, list_statuses};
pub use resources::resource_not_found;
