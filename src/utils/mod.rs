mod io_utils;
mod readers;
mod util;

pub use io_utils::{create_writer, open_writer};
pub use readers::open_reader;
pub use util::{handle_error_and_exit, Result};
