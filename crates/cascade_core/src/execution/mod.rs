pub mod context;
pub mod map_task;
