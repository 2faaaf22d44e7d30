//! 标识符类型
//!
//! 定义节点、链路和共享信道的唯一标识符。

use serde::{Deserialize, Serialize};

/// 节点标识符（按创建顺序编号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// 单向点对点链路标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub usize);

/// 共享信道标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub usize);
