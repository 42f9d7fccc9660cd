//! 查询上下文
//!
//! 封装"哪个队列的第几个任务，在查哪个邮件号"这一信息，用作日志前缀

use std::fmt::Display;

use crate::models::ConsignmentId;

#[derive(Debug, Clone)]
pub struct TrackingCtx {
    /// 邮件号
    pub consignment: String,

    /// 队列名称（interactive / bulk）
    pub queue: String,

    /// 任务在队列中的序号（从1开始，仅用于日志显示）
    pub seq: u64,
}

impl TrackingCtx {
    pub fn new(consignment: &ConsignmentId, queue: impl Into<String>, seq: u64) -> Self {
        Self {
            consignment: consignment.to_string(),
            queue: queue.into(),
            seq,
        }
    }
}

impl Display for TrackingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}#{} 邮件号#{}]", self.queue, self.seq, self.consignment)
    }
}
