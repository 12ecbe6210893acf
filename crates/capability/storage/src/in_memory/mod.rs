//! 内存存储实现
//!
//! 用于测试与 `VAN_PERSISTENCE=memory` 模式，进程退出即丢失。

pub mod blob;

pub use blob::InMemoryBlobStore;
