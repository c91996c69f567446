mod help;
mod modal;
mod panels;

pub use help::render_help;
pub use modal::{render_modal, render_notice};
pub use panels::{render_files, render_system, render_terminal};
