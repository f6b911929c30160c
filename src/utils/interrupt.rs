//! # 中断信号
//!
//! 后台线程上运行一个单线程 tokio 运行时等待 Ctrl+C，收到后通过
//! `watch` 通道广播关闭标志。导出流程在记录之间检查该标志，
//! 停止拉取新记录并让写出器收尾。再次按下 Ctrl+C 则立即退出。
//!
//! ## 依赖关系
//! - 被 `commands/export.rs`, `commands/derive.rs` 使用
//! - 使用 `tokio` (rt, signal, sync)

use log::{info, warn};
use std::thread;
use tokio::sync::watch;

/// 关闭标志的接收端
pub type ShutdownSignal = watch::Receiver<bool>;

/// 启动 Ctrl+C 监听，返回关闭标志
pub fn listen_for_interrupt() -> ShutdownSignal {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let spawned = thread::Builder::new()
        .name("crystex-interrupt".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Cannot start the interrupt listener: {}", e);
                    return;
                }
            };

            runtime.block_on(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                info!("Received SIGINT (Ctrl+C), stopping after the current record");
                let _ = shutdown_tx.send(true);

                // 第二次 Ctrl+C 立即退出
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Received a second SIGINT, exiting immediately");
                    std::process::exit(130);
                }
            });
        });

    if let Err(e) = spawned {
        warn!("Cannot spawn the interrupt listener thread: {}", e);
    }

    shutdown_rx
}

/// 是否已收到关闭请求
pub fn is_requested(signal: Option<&ShutdownSignal>) -> bool {
    signal.is_some_and(|rx| *rx.borrow())
}
