use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

use crate::analytics::VisitRecorder;

/// 单个收尾任务的兜底超时（秒）
const TASK_TIMEOUT_SECS: u64 = 30;

/// 服务器退出后的收尾：排空访问记录队列
///
/// `grace` 之内未排空的记录将被丢弃并计入 dropped 计数。
pub async fn perform_shutdown_tasks(recorder: &VisitRecorder, grace: Duration) {
    let drain = recorder.shutdown(grace);

    match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), drain).await {
        Ok(drained) => {
            info!(
                "Visit recorder drained: {} records flushed, {} dropped in total",
                drained,
                recorder.dropped_count()
            );
        }
        Err(_) => {
            error!(
                "Visit recorder drain timed out after {} seconds",
                TASK_TIMEOUT_SECS
            );
        }
    }
}
