pub mod controls;
pub mod debug;
pub mod scroll_list;
pub mod viewport;
