// 文件键值存储
//
// 每个键对应数据目录 kv/ 子目录下的一个 JSON 文件，与配置文件互不干扰。
// 写入先落到临时文件再重命名，避免进程中断留下半个文档。

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

use crate::modules::persona::ports::{KeyValueStore, RepositoryError};

/// 键值文件所在的子目录
const KV_DIR_NAME: &str = "kv";

/// 文件键值存储
pub struct FileKeyValueStore {
    data_dir: PathBuf,
    kv_dir: PathBuf,
    cache: RwLock<HashMap<String, String>>,
}

impl FileKeyValueStore {
    /// 创建文件键值存储
    ///
    /// # Arguments
    /// * `data_dir` - 应用数据目录路径，不存在时自动创建
    pub async fn new(data_dir: PathBuf) -> Result<Self, RepositoryError> {
        let kv_dir = data_dir.join(KV_DIR_NAME);
        fs::create_dir_all(&kv_dir)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(Self {
            data_dir,
            kv_dir,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 键到文件路径的映射
    ///
    /// ASCII 字母数字和 `-` 原样保留，其余字节编码为 `_xx`，不同的键总是对应不同的文件
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file_stem = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_stem.push(char::from(byte));
            } else {
                file_stem.push_str(&format!("_{:02x}", byte));
            }
        }
        self.kv_dir.join(format!("{}.json", file_stem))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        if let Some(value) = self.cache.read().await.get(key) {
            return Ok(Some(value.clone()));
        }

        let path = self.path_for(key);
        let value = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepositoryError::Storage(e.to_string())),
        };

        self.cache
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), RepositoryError> {
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, &value)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        self.cache.write().await.insert(key.to_string(), value);
        tracing::debug!("[KeyValueStore] Wrote {:?}", path);
        Ok(())
    }
}
