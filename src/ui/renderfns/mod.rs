pub mod footer;
pub mod header;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{centered_rect, priority_color, truncate};
