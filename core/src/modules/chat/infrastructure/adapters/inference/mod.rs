// Inference Adapters
// 推理后端的适配器实现

mod local_server;
mod mock;

pub use local_server::*;
pub use mock::*;
