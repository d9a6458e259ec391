mod about;
mod api_browser;
mod post_detail;
mod task_list;

pub use about::AboutView;
pub use api_browser::{ApiBrowserView, ApiTab};
pub use post_detail::PostDetailView;
pub use task_list::TaskListView;
