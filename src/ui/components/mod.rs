mod command_input;
mod input;
mod key_result;
mod search_input;
mod spinner;
mod task_form;

pub use command_input::{CommandEvent, CommandInput};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
pub use spinner::Spinner;
pub use task_form::{FormEvent, TaskDraft, TaskForm};
