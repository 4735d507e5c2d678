// ==========================================
// 库存盘点对账系统 - 扫码会话
// ==========================================
// 职责: 从扫码设备持续读取编号，去抖后逐个交给处理方
// 并发模型: 单个 tokio 任务串行处理，处理方一次只收到一个编号
// 取消: stop() 之后不会再触发任何回调；任务退出前释放设备
// 去抖: 窗口内与上一次相同的编号被抑制（相同编号持续出现会延长窗口）
// ==========================================

use crate::domain::types::ScanOutcome;
use crate::engine::error::{EngineError, EngineResult};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// 默认去抖窗口（毫秒）
pub const DEFAULT_DEBOUNCE_MS: u64 = 700;

// ==========================================
// Trait: ScanSource - 扫码设备
// ==========================================
#[async_trait]
pub trait ScanSource: Send {
    /// 等待下一个识别结果
    ///
    /// # 返回
    /// - Ok(Some(code)): 原始识别内容
    /// - Ok(None): 设备已无更多输入
    async fn next_code(&mut self) -> EngineResult<Option<String>>;

    /// 释放设备（会话结束时调用一次）
    async fn release(&mut self) -> EngineResult<()>;
}

// ==========================================
// Trait: ScanSink - 扫码处理方
// ==========================================
#[async_trait]
pub trait ScanSink: Send + Sync {
    /// 处理一次去抖后的编号（已 TRIM，非空）
    async fn on_scan(&self, code: &str) -> EngineResult<ScanOutcome>;
}

// ==========================================
// StreamScanSource - 任意字符串流适配
// ==========================================
pub struct StreamScanSource<S> {
    stream: Option<S>,
}

impl<S> StreamScanSource<S>
where
    S: Stream<Item = String> + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }
}

#[async_trait]
impl<S> ScanSource for StreamScanSource<S>
where
    S: Stream<Item = String> + Unpin + Send,
{
    async fn next_code(&mut self) -> EngineResult<Option<String>> {
        match self.stream.as_mut() {
            Some(stream) => Ok(stream.next().await),
            None => Ok(None),
        }
    }

    async fn release(&mut self) -> EngineResult<()> {
        self.stream = None;
        Ok(())
    }
}

// ==========================================
// ReaderScanSource - 行输入设备（USB 扫码枪/手工输入，每行一个编号）
// ==========================================
// 阻塞读取放在独立线程中，经通道送入会话；
// release() 丢弃接收端即可，不等待线程上的阻塞读
// ==========================================

/// 读取线程与会话之间的缓冲行数
const READER_CHANNEL_CAPACITY: usize = 64;

pub struct ReaderScanSource {
    rx: Option<mpsc::Receiver<io::Result<String>>>,
}

impl ReaderScanSource {
    /// 在独立线程上逐行读取 reader
    ///
    /// 线程在输入结束、读取失败或会话释放设备后的下一行退出
    pub fn spawn<R>(reader: R) -> EngineResult<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(READER_CHANNEL_CAPACITY);
        std::thread::Builder::new()
            .name("scan-reader".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.blocking_send(line).is_err() || failed {
                        break;
                    }
                }
                debug!("扫码读取线程退出");
            })
            .map_err(|e| EngineError::ScanSourceError(e.to_string()))?;

        Ok(Self { rx: Some(rx) })
    }

    /// 标准输入
    pub fn stdin() -> EngineResult<Self> {
        Self::spawn(io::BufReader::new(io::stdin()))
    }

    pub fn is_released(&self) -> bool {
        self.rx.is_none()
    }
}

#[async_trait]
impl ScanSource for ReaderScanSource {
    async fn next_code(&mut self) -> EngineResult<Option<String>> {
        let Some(rx) = self.rx.as_mut() else {
            return Ok(None);
        };
        match rx.recv().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(EngineError::ScanSourceError(e.to_string())),
            None => Ok(None),
        }
    }

    async fn release(&mut self) -> EngineResult<()> {
        self.rx = None;
        Ok(())
    }
}

// ==========================================
// Debouncer - 相同编号去抖
// ==========================================
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// 是否放行该编号（无论是否放行都会刷新最近一次记录）
    pub fn accept(&mut self, code: &str, now: Instant) -> bool {
        let suppressed = match &self.last {
            Some((last_code, at)) => {
                last_code == code && now.saturating_duration_since(*at) < self.window
            }
            None => false,
        };
        self.last = Some((code.to_string(), now));
        !suppressed
    }
}

// ==========================================
// SessionReport - 会话统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub received: usize,   // 设备产出总数
    pub blank: usize,      // 空白（忽略）
    pub suppressed: usize, // 去抖抑制
    pub dispatched: usize, // 交给处理方
    pub recorded: usize,   // 结果为 Recorded
}

// ==========================================
// ScanSession - 扫码会话
// ==========================================
pub struct ScanSession {
    cancel_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
    handle: Option<JoinHandle<EngineResult<SessionReport>>>,
}

impl ScanSession {
    /// 启动会话
    ///
    /// # 参数
    /// - source: 扫码设备（会话持有，结束时释放）
    /// - sink: 处理方
    /// - debounce: 去抖窗口
    pub fn spawn<S, K>(source: S, sink: Arc<K>, debounce: Duration) -> Self
    where
        S: ScanSource + 'static,
        K: ScanSink + ?Sized + 'static,
    {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let result = run_loop(source, sink, debounce, cancel_rx).await;
            let _ = done_tx.send(true);
            result
        });

        info!(debounce_ms = debounce.as_millis() as u64, "扫码会话已启动");

        Self {
            cancel_tx,
            done_rx,
            handle: Some(handle),
        }
    }

    /// 会话是否已结束（设备耗尽或已停止）
    pub fn is_finished(&self) -> bool {
        *self.done_rx.borrow()
    }

    /// 等待会话自行结束（设备无更多输入）
    pub async fn closed(&mut self) {
        let _ = self.done_rx.wait_for(|done| *done).await;
    }

    /// 停止会话: 请求取消 → 等待任务退出（设备在任务内释放）
    pub async fn stop(&mut self) -> EngineResult<SessionReport> {
        let _ = self.cancel_tx.send(true);

        let handle = self.handle.take().ok_or(EngineError::SessionStopped)?;
        let report = handle.await??;

        info!(
            received = report.received,
            dispatched = report.dispatched,
            recorded = report.recorded,
            "扫码会话已停止"
        );
        Ok(report)
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        // 未 stop 就丢弃时同样终止循环
        let _ = self.cancel_tx.send(true);
    }
}

#[instrument(skip_all)]
async fn run_loop<S, K>(
    mut source: S,
    sink: Arc<K>,
    debounce: Duration,
    mut cancel_rx: watch::Receiver<bool>,
) -> EngineResult<SessionReport>
where
    S: ScanSource,
    K: ScanSink + ?Sized,
{
    let mut debouncer = Debouncer::new(debounce);
    let mut report = SessionReport::default();
    let mut failure: Option<EngineError> = None;

    loop {
        if *cancel_rx.borrow() {
            break;
        }

        let next = tokio::select! {
            biased;
            _ = cancel_rx.changed() => break,
            next = source.next_code() => next,
        };

        let raw = match next {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("扫码设备输入结束");
                break;
            }
            Err(e) => {
                error!(error = %e, "扫码设备读取失败");
                failure = Some(e);
                break;
            }
        };
        report.received += 1;

        let code = raw.trim();
        if code.is_empty() {
            report.blank += 1;
            continue;
        }

        if !debouncer.accept(code, Instant::now()) {
            debug!(code = %code, "去抖窗口内的重复编号，已忽略");
            report.suppressed += 1;
            continue;
        }

        // 取消请求之后不再回调
        if *cancel_rx.borrow() {
            break;
        }

        report.dispatched += 1;
        match sink.on_scan(code).await {
            Ok(outcome) => {
                if outcome.is_recorded() {
                    report.recorded += 1;
                }
                debug!(code = %code, outcome = %outcome, "扫码已处理");
            }
            Err(e) => {
                error!(code = %code, error = %e, "扫码处理失败，会话终止");
                failure = Some(e);
                break;
            }
        }
    }

    if let Err(e) = source.release().await {
        warn!(error = %e, "扫码设备释放失败");
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debouncer_suppresses_identical_within_window() {
        let mut d = Debouncer::new(Duration::from_millis(700));
        let t0 = Instant::now();
        assert!(d.accept("A1", t0));
        assert!(!d.accept("A1", t0 + Duration::from_millis(300)));
        // 窗口随重复出现而延长
        assert!(!d.accept("A1", t0 + Duration::from_millis(900)));
        assert!(d.accept("A1", t0 + Duration::from_millis(1700)));
    }

    #[test]
    fn test_debouncer_different_code_passes() {
        let mut d = Debouncer::new(Duration::from_millis(700));
        let t0 = Instant::now();
        assert!(d.accept("A1", t0));
        assert!(d.accept("A2", t0 + Duration::from_millis(10)));
        assert!(d.accept("A1", t0 + Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_stream_source_release() {
        let mut source = StreamScanSource::new(futures::stream::iter(vec!["A1".to_string()]));
        assert_eq!(source.next_code().await.unwrap(), Some("A1".to_string()));
        source.release().await.unwrap();
        assert!(source.is_released());
        assert_eq!(source.next_code().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reader_source_reads_lines_until_eof() {
        let input = io::Cursor::new(b"A1\r\n\nB7\n".to_vec());
        let mut source = ReaderScanSource::spawn(input).unwrap();
        assert_eq!(source.next_code().await.unwrap(), Some("A1".to_string()));
        assert_eq!(source.next_code().await.unwrap(), Some(String::new()));
        assert_eq!(source.next_code().await.unwrap(), Some("B7".to_string()));
        assert_eq!(source.next_code().await.unwrap(), None);

        source.release().await.unwrap();
        assert!(source.is_released());
        assert_eq!(source.next_code().await.unwrap(), None);
    }
}
