mod user;
mod forms;
mod task;
mod reference;
mod identity;

pub use user::{User, NewUser, PublicUser, UserSummary};
pub use forms::{LoginForm, RegisterForm, CreateTaskForm, UpdateTaskForm, TaskQuery};
pub(crate) use forms::require_text;
pub use task::{Task, NewTask, ExpandedTask, TaskFilter, parse_deadline};
pub use reference::{ReferenceTable, ReferenceRow, Priority, Difficulty, Status};
pub use identity::{Identity, SESSION_USER_ID_KEY};
