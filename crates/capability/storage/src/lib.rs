//! # Van Storage 模块
//!
//! 提供实体集合的持久化抽象：上层服务只面对 `EntityStore<T>`，
//! 底层通过 `BlobStore` 以“键 → JSON 文档”的方式保存整个集合。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：`BlobStore` 文档存储接口、`Entity` 实体约束
//! 2. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 3. **实现层**：
//!    - `json_file`：每个键一个 JSON 文件（缩进格式），所有读写经过同一把 FIFO 锁
//!    - `in_memory/`：内存实现（测试与 `VAN_PERSISTENCE=memory` 模式）
//! 4. **集合层** (`entity_store.rs`)：内存中的权威集合 + 落盘
//!
//! ## 生命周期
//!
//! `EntityStore::new` 不做任何 I/O；`load` 读取持久化数据（缺失或损坏时使用默认数据）
//! 后才进入就绪状态。就绪前的任何访问都会返回 `StorageError::NotReady`，
//! 调用方不会读到“加载中”的半成品集合。
//!
//! ## 降级模式
//!
//! 落盘失败只记录日志与计数，内存集合仍然是权威数据，下一次成功写入时恢复一致。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use van_storage::{EntityStore, JsonFileStore};
//!
//! let blob = Arc::new(JsonFileStore::new("./data"));
//! let tanks: EntityStore<Tank> = EntityStore::new("tanks.json", Some(blob));
//! tanks.load(default_tanks).await;
//! let active = tanks.snapshot().await?;
//! ```

pub mod entities;
pub mod entity_store;
pub mod error;
pub mod in_memory;
pub mod json_file;
pub mod traits;

pub use entity_store::EntityStore;
pub use error::StorageError;
pub use in_memory::InMemoryBlobStore;
pub use json_file::JsonFileStore;
pub use traits::{BlobStore, Entity};
