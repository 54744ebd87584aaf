pub mod console;
pub mod exec;
pub mod fs;
