//! 有界并发任务队列 - 编排层
//!
//! ## 职责
//!
//! 1. **准入**：任务按提交顺序进入有界积压通道，积压满时直接拒绝
//! 2. **并发控制**：分发任务先取得 Semaphore 许可，再取出任务并 spawn，
//!    同时执行的查询不超过 K 个
//! 3. **隔离**：单个查询失败或 panic 只影响它自己的结果，许可总会归还
//! 4. **统计**：提交 / 成功 / 失败 / 拒绝 / 在途 / 峰值
//!
//! 每个队列实例相互独立，交互队列和批量队列各自持有自己的许可。

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::QueueError;
use crate::models::{ConsignmentId, TrackingResult};
use crate::workflow::{AttemptRunner, TrackingCtx};

type JobOutcome = Result<TrackingResult, QueueError>;

/// 排队中的任务，结果送达后即丢弃
pub struct TrackingJob {
    pub id: ConsignmentId,
    pub seq: u64,
    pub submitted_at: DateTime<Local>,
    responder: oneshot::Sender<JobOutcome>,
}

/// 队列计数器
#[derive(Debug, Default)]
struct QueueStats {
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
}

impl QueueStats {
    fn started(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn finished(&self, success: bool) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> QueueStatsSnapshot {
        QueueStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
        }
    }
}

/// 队列统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStatsSnapshot {
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rejected: u64,
    pub in_flight: u64,
    pub peak_in_flight: u64,
}

/// 有界并发任务队列
pub struct JobQueue {
    name: String,
    concurrency: usize,
    backlog_limit: usize,
    tx: mpsc::Sender<TrackingJob>,
    accepting: AtomicBool,
    next_seq: AtomicU64,
    stats: Arc<QueueStats>,
    shutdown_tx: watch::Sender<bool>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl JobQueue {
    /// 创建队列并启动分发任务（必须在 tokio 运行时内调用）
    pub fn new(
        name: impl Into<String>,
        concurrency: usize,
        backlog_limit: usize,
        runner: Arc<dyn AttemptRunner>,
    ) -> Self {
        let name = name.into();
        let concurrency = concurrency.max(1);
        let backlog_limit = backlog_limit.max(1);
        let (tx, rx) = mpsc::channel(backlog_limit);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(QueueStats::default());

        let dispatcher = Dispatcher {
            name: name.clone(),
            concurrency,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            runner,
            stats: stats.clone(),
        };
        let handle = tokio::spawn(dispatcher.run(rx, shutdown_rx));

        info!(
            "📋 队列 {} 已启动: 并发上限 {}, 积压上限 {}",
            name, concurrency, backlog_limit
        );

        Self {
            name,
            concurrency,
            backlog_limit,
            tx,
            accepting: AtomicBool::new(true),
            next_seq: AtomicU64::new(0),
            stats,
            shutdown_tx,
            dispatcher: Mutex::new(Some(handle)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn backlog_limit(&self) -> usize {
        self.backlog_limit
    }

    /// 提交一个查询并等待其结果
    ///
    /// 积压已满时立即返回 `QueueError::Backlogged`，不会等待。
    pub async fn submit(&self, id: ConsignmentId) -> JobOutcome {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(self.closed());
        }

        let (responder, result_rx) = oneshot::channel();
        let job = TrackingJob {
            id,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed) + 1,
            submitted_at: Local::now(),
            responder,
        };

        match self.tx.try_send(job) {
            Ok(()) => {
                self.stats.submitted.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(job)) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                warn!("⚠️ 队列 {} 积压已满，拒绝 {}", self.name, job.id);
                return Err(QueueError::Backlogged {
                    queue: self.name.clone(),
                    limit: self.backlog_limit,
                });
            }
            Err(TrySendError::Closed(_)) => return Err(self.closed()),
        }

        result_rx.await.map_err(|_| QueueError::WorkerLost {
            queue: self.name.clone(),
        })?
    }

    pub fn stats(&self) -> QueueStatsSnapshot {
        self.stats.snapshot()
    }

    /// 停止接收新任务，执行完已排队和在途的任务后返回
    pub async fn shutdown(&self) {
        if !self.accepting.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("🛑 队列 {} 停止接收任务，等待剩余任务完成...", self.name);
        let _ = self.shutdown_tx.send(true);

        if let Some(handle) = self.dispatcher.lock().await.take() {
            if let Err(e) = handle.await {
                error!("队列 {} 分发任务异常退出: {}", self.name, e);
            }
        }

        let stats = self.stats();
        info!(
            "✓ 队列 {} 已关闭: 成功 {} / 失败 {} / 拒绝 {}",
            self.name, stats.succeeded, stats.failed, stats.rejected
        );
    }

    fn closed(&self) -> QueueError {
        QueueError::Closed {
            queue: self.name.clone(),
        }
    }
}

struct Dispatcher {
    name: String,
    concurrency: usize,
    semaphore: Arc<Semaphore>,
    runner: Arc<dyn AttemptRunner>,
    stats: Arc<QueueStats>,
}

impl Dispatcher {
    async fn run(self, mut rx: mpsc::Receiver<TrackingJob>, mut shutdown: watch::Receiver<bool>) {
        let mut closing = false;

        loop {
            // 先取许可再取任务：积压通道中的任务数就是真实排队数
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let next = if closing {
                rx.recv().await
            } else {
                tokio::select! {
                    job = rx.recv() => job,
                    _ = shutdown.changed() => {
                        closing = true;
                        rx.close();
                        continue;
                    }
                }
            };

            let Some(job) = next else { break };
            self.spawn_attempt(job, permit);
        }

        // 等待所有在途任务归还许可
        let _ = self.semaphore.acquire_many(self.concurrency as u32).await;
        debug!("队列 {} 分发任务结束", self.name);
    }

    fn spawn_attempt(&self, job: TrackingJob, permit: tokio::sync::OwnedSemaphorePermit) {
        let runner = self.runner.clone();
        let stats = self.stats.clone();
        let queue = self.name.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let TrackingJob {
                id,
                seq,
                submitted_at,
                responder,
            } = job;
            let ctx = TrackingCtx::new(&id, queue.as_str(), seq);

            stats.started();
            let waited = Local::now().signed_duration_since(submitted_at);
            debug!("{} 开始执行 (排队 {} ms)", ctx, waited.num_milliseconds());

            let outcome = match AssertUnwindSafe(runner.run_attempt(&id, &ctx))
                .catch_unwind()
                .await
            {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(e)) => Err(QueueError::Infrastructure(e)),
                Err(_) => {
                    error!("{} ❌ 查询任务 panic", ctx);
                    Ok(TrackingResult::internal_error(id.as_str()))
                }
            };

            stats.finished(matches!(&outcome, Ok(result) if result.status().is_success()));

            if responder.send(outcome).is_err() {
                debug!("{} 调用方已断开，丢弃结果", ctx);
            }
        });
    }
}
