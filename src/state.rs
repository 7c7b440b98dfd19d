use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{scheduler::SendScheduler, store::ConfigStore};

/* ------------ 設定文件：控制端與排程器共用 ------------ */
pub type SharedStore = Arc<RwLock<ConfigStore>>;

/* ------------ 唯一的發送排程器 ------------ */
pub type SharedScheduler = Arc<SendScheduler>;
