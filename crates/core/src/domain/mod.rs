pub mod role;
pub mod task;
pub mod transcript;
pub mod tree;
