mod task_manager;
mod timer;

pub use task_manager::TaskManager;
pub use timer::ReconnectTimer;
