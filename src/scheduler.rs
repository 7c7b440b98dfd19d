//! 定時發送彈幕的排程器。
//!
//! 兩個狀態：`Idle` / `Sending`。`toggle` 是唯一的對外操作，
//! 發送中呼叫一律停止，不會開出第二條迴圈。

use serde::Serialize;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{sync::Mutex, task::JoinHandle, time};
use tracing::{debug, info, warn};

use crate::{
    danmu::{DanmuSink, SendParams},
    error::AppResult,
    state::SharedStore,
    store::DEFAULT_TIME_STEP,
    utils::validate::interval_duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendState {
    Idle,
    Sending,
}

/// 目前迴圈綁定的參數（不含憑證）
#[derive(Debug, Clone, Serialize)]
pub struct RunView {
    pub room_id: String,
    pub message: String,
    pub color: String,
    pub font_size: u32,
    pub mode: u8,
    pub interval_seconds: f64,
}

struct ActiveRun {
    active: Arc<AtomicBool>,
    params: SendParams,
    task: JoinHandle<()>,
}

impl ActiveRun {
    fn is_sending(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

pub struct SendScheduler {
    store: SharedStore,
    sink: Arc<dyn DanmuSink>,
    run: Mutex<Option<ActiveRun>>,
}

impl SendScheduler {
    pub fn new(store: SharedStore, sink: Arc<dyn DanmuSink>) -> Self {
        Self { store, sink, run: Mutex::new(None) }
    }

    /// `Idle` ⇒ 記住房間並以 `params` 開一條迴圈；
    /// `Sending` ⇒ 通知迴圈停止，忽略 `params`
    pub async fn toggle(&self, params: SendParams) -> AppResult<SendState> {
        let mut run = self.run.lock().await;

        if let Some(prev) = run.take() {
            if prev.active.swap(false, Ordering::SeqCst) {
                info!(room_id = %prev.params.room_id, "stopped sending danmu");
                return Ok(SendState::Idle);
            }
            // 迴圈已自行結束（空訊息），這次視為重新開始
        }

        self.store.write().await.upsert_room(
            &params.room_id,
            &params.csrf,
            &params.csrf_token,
            &params.sessdata,
        )?;

        let active = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(send_loop(self.sink.clone(), params.clone(), active.clone()));
        info!(room_id = %params.room_id, interval = params.interval_seconds, "started sending danmu");

        *run = Some(ActiveRun { active, params, task });
        Ok(SendState::Sending)
    }

    pub async fn state(&self) -> SendState {
        match self.run.lock().await.as_ref() {
            Some(r) if r.is_sending() => SendState::Sending,
            _ => SendState::Idle,
        }
    }

    pub async fn current(&self) -> Option<RunView> {
        let run = self.run.lock().await;
        let p = &run.as_ref().filter(|r| r.is_sending())?.params;
        Some(RunView {
            room_id: p.room_id.clone(),
            message: p.message.clone(),
            color: p.color.clone(),
            font_size: p.font_size,
            mode: p.mode,
            interval_seconds: p.interval_seconds,
        })
    }

    /// 程式結束前呼叫：停止並中斷仍在睡眠的迴圈
    pub async fn shutdown(&self) {
        if let Some(r) = self.run.lock().await.take() {
            r.active.store(false, Ordering::SeqCst);
            r.task.abort();
        }
    }
}

async fn send_loop(sink: Arc<dyn DanmuSink>, params: SendParams, active: Arc<AtomicBool>) {
    // 驗證過的設定一定換得成 Duration；手改設定檔的怪值才會退回預設
    let pause = interval_duration(params.interval_seconds).unwrap_or_else(|| {
        warn!(interval = params.interval_seconds, "bad interval, using default");
        Duration::from_secs_f64(DEFAULT_TIME_STEP)
    });

    while active.load(Ordering::SeqCst) {
        if params.message.trim().is_empty() {
            info!(room_id = %params.room_id, "danmu text is empty, stopping");
            active.store(false, Ordering::SeqCst);
            break;
        }

        // 單次失敗不停止迴圈
        let res = sink.send(&params).await;
        debug!(ok = res.ok, raw = %res.raw, "tick");

        if !active.load(Ordering::SeqCst) {
            break;
        }
        time::sleep(pause).await;
    }
}
