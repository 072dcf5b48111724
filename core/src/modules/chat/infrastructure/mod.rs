// Chat Infrastructure Layer
// 基础设施层包含端口的具体实现

pub mod adapters;
mod engine_handle;

// 重导出常用类型
pub use adapters::inference::{
    LocalServerConfig, LocalServerEngine, MockInferenceEngine, MockReply,
};
pub use engine_handle::{EngineHandle, EnginePhase, EngineStatus};
