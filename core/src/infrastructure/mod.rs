// Infrastructure - 跨模块共享的基础设施

mod event_bus;

pub use event_bus::{AppEvent, EventBus};
