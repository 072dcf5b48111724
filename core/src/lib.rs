pub mod infrastructure;
pub mod modules;
pub mod shared;

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use infrastructure::EventBus;
use modules::chat::{
    EngineHandle, InferenceEngine, InferenceError, LocalServerConfig, LocalServerEngine,
};
use modules::config::{AppConfig, InMemoryConfigRepository};
use modules::persona::{FileKeyValueStore, KeyValueStore, PersonaId};
use modules::{ChatModule, ConfigModule, PersonaModule};
use shared::{AppError, AppResult};

/// 初始化日志，默认级别 info，可用 RUST_LOG 覆盖；重复调用无副作用
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// 应用装配根
pub struct MirrorMind {
    config: AppConfig,
    config_module: ConfigModule,
    personas: PersonaModule,
    chat: ChatModule,
    engine: Arc<EngineHandle>,
    events: Arc<EventBus>,
}

impl MirrorMind {
    /// 从数据目录启动：读取配置，打开文件存储和本地推理服务
    pub async fn bootstrap(data_dir: PathBuf) -> AppResult<Self> {
        init_logging();
        tracing::info!("MirrorMind starting...");
        tracing::info!("App data directory: {:?}", data_dir);

        let config_module = ConfigModule::new_with_store(data_dir.clone());
        let config = config_module
            .get_all()
            .await
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        config
            .validate()
            .map_err(|errors| AppError::ConfigError(errors.join("; ")))?;

        let store = FileKeyValueStore::new(data_dir)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;
        let engine = LocalServerEngine::new(LocalServerConfig {
            base_url: config.engine.base_url.clone(),
            timeout_secs: config.engine.timeout_secs,
        })
        .map_err(|e| AppError::EngineError(e.to_string()))?;

        Ok(Self::assemble(
            config_module,
            config,
            Arc::new(store),
            Arc::new(engine),
        ))
    }

    /// 使用注入的存储和推理引擎装配，配置只保存在内存中
    pub fn with_components(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        engine: Arc<dyn InferenceEngine>,
    ) -> Self {
        let config_module = ConfigModule::with_repository(Arc::new(
            InMemoryConfigRepository::with_config(config.clone()),
        ));
        Self::assemble(config_module, config, store, engine)
    }

    fn assemble(
        config_module: ConfigModule,
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        engine: Arc<dyn InferenceEngine>,
    ) -> Self {
        let events = Arc::new(EventBus::new());
        let engine = Arc::new(EngineHandle::new(engine, config.engine.model_id.clone()));

        let personas = PersonaModule::with_store(store, config.storage.namespace.clone());
        let chat = ChatModule::with_repository(
            personas.repository().clone(),
            engine.clone(),
            events.clone(),
            config.conversation.clone(),
        );

        tracing::info!(
            "MirrorMind ready (namespace: {}, model: {})",
            config.storage.namespace,
            config.engine.model_id
        );

        Self {
            config,
            config_module,
            personas,
            chat,
            engine,
            events,
        }
    }

    /// 初始化推理引擎，并发调用共享同一次尝试
    pub async fn initialize_engine(&self) -> Result<(), InferenceError> {
        self.engine.initialize().await
    }

    /// 删除角色及其全部会话，同时释放对应的对话编排器
    pub async fn delete_persona(&self, id: PersonaId) -> bool {
        let deleted = self.personas.delete_persona(id).await;
        if deleted {
            self.chat.forget_persona(id).await;
        }
        deleted
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_module(&self) -> &ConfigModule {
        &self.config_module
    }

    pub fn personas(&self) -> &PersonaModule {
        &self.personas
    }

    pub fn chat(&self) -> &ChatModule {
        &self.chat
    }

    pub fn engine(&self) -> &Arc<EngineHandle> {
        &self.engine
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }
}
