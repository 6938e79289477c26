//! 비동기 로깅 파이프라인
//!
//! 생산자는 레벨 검사 후 풀에서 꺼낸 레코드를 고정 크기 큐에 넣고,
//! 단일 워커 태스크가 포매팅과 싱크 전달을 담당합니다.
//!
//! 큐가 가득 차면 생산자가 대기합니다 (backpressure). 메시지를 버리지 않는 대신
//! 느린 싱크는 파이프라인 전체를 느리게 만듭니다.

use chrono::Local;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::panic::{AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::formatter::{DefaultFormatter, LogFormatter, LogLevel, LogRecord};
use crate::pool::{PoolStats, RecordPool};
use crate::writer::{ConsoleSink, LogSink};

/// 기본 큐 크기
pub const LOG_MSG_BUFFER_SIZE: usize = 1024;

const STATE_STOPPED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_SHUTTING_DOWN: u8 = 2;
const STATE_STARTING: u8 = 3;

/// 로거 수명 주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    /// 정지됨 (설정 변경 가능, emit 무시)
    Stopped,
    /// 워커 생성 중
    Starting,
    /// 실행 중 (워커 태스크 1개 존재)
    Running,
    /// 종료 중 (워커가 남은 레코드를 처리하는 중)
    ShuttingDown,
}

impl LoggerState {
    fn from_u8(value: u8) -> Self {
        match value {
            STATE_STARTING => LoggerState::Starting,
            STATE_RUNNING => LoggerState::Running,
            STATE_SHUTTING_DOWN => LoggerState::ShuttingDown,
            _ => LoggerState::Stopped,
        }
    }
}

/// 워커로 전달되는 명령
enum Command {
    /// 레코드 전달
    Write(LogRecord),
    /// 앞서 들어온 레코드를 모두 처리한 뒤 싱크 플러시
    Flush(oneshot::Sender<()>),
}

type Sinks = Vec<Box<dyn LogSink>>;

/// 실행 중인 워커 핸들
struct WorkerHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<Sinks>,
}

/// 비동기 로거
///
/// `Arc<Logger>`로 공유해 여러 태스크/스레드에서 동시에 사용할 수 있습니다.
/// `start()`는 tokio 런타임 안에서 호출해야 합니다.
pub struct Logger {
    state: AtomicU8,
    level: AtomicU8,
    call_depth: AtomicU32,
    capacity: usize,
    /// 정지 상태에서 보관하는 싱크 목록 (실행 중에는 워커가 소유)
    sinks: Mutex<Sinks>,
    formatter: Mutex<Arc<dyn LogFormatter>>,
    pool: Arc<RecordPool>,
    sender: RwLock<Option<mpsc::Sender<Command>>>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl Logger {
    /// 새 로거 생성 (싱크 없음, 최소 레벨 Info, 위치 수집 안 함)
    pub fn new() -> Self {
        Self::with_capacity(LOG_MSG_BUFFER_SIZE)
    }

    /// 큐 크기를 지정해 로거 생성
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: AtomicU8::new(STATE_STOPPED),
            level: AtomicU8::new(LogLevel::Info.rank()),
            call_depth: AtomicU32::new(0),
            capacity,
            sinks: Mutex::new(Vec::new()),
            formatter: Mutex::new(Arc::new(DefaultFormatter)),
            pool: Arc::new(RecordPool::new(capacity)),
            sender: RwLock::new(None),
            worker: Mutex::new(None),
        }
    }

    /// 표준 출력 싱크가 등록된 로거
    pub fn with_console() -> Self {
        let logger = Self::new();
        logger.add_sink(ConsoleSink::stdout());
        logger
    }

    /// 최소 레벨, 호출 위치 깊이, 포매터, 싱크 목록을 한 번에 설정
    ///
    /// 정지 상태에서만 적용되며, 실행 중에는 무시하고 `false`를 반환합니다.
    pub fn configure(
        &self,
        level: LogLevel,
        call_depth: u32,
        formatter: Arc<dyn LogFormatter>,
        sinks: Vec<Box<dyn LogSink>>,
    ) -> bool {
        let mut current = self.sinks.lock();
        if !self.accepts_reconfigure("configure") {
            return false;
        }
        self.set_level(level);
        self.set_call_depth(call_depth);
        *self.formatter.lock() = formatter;
        *current = sinks;
        true
    }

    /// 싱크 추가 (등록 순서 = 전달 순서)
    pub fn add_sink<S: LogSink + 'static>(&self, sink: S) -> bool {
        let mut sinks = self.sinks.lock();
        if !self.accepts_reconfigure("add_sink") {
            return false;
        }
        sinks.push(Box::new(sink));
        true
    }

    /// 등록된 싱크 모두 제거
    pub fn clear_sinks(&self) -> bool {
        let mut sinks = self.sinks.lock();
        if !self.accepts_reconfigure("clear_sinks") {
            return false;
        }
        sinks.clear();
        true
    }

    pub fn set_formatter<F: LogFormatter + 'static>(&self, formatter: F) -> bool {
        let _sinks = self.sinks.lock();
        if !self.accepts_reconfigure("set_formatter") {
            return false;
        }
        *self.formatter.lock() = Arc::new(formatter);
        true
    }

    fn accepts_reconfigure(&self, operation: &'static str) -> bool {
        let state = self.state();
        if state != LoggerState::Stopped {
            warn!(operation, state = ?state, "실행 중인 로거의 설정 변경 무시됨");
            return false;
        }
        true
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_rank(self.level.load(Ordering::Relaxed)).unwrap_or(LogLevel::Info)
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level.rank(), Ordering::Relaxed);
    }

    pub fn call_depth(&self) -> u32 {
        self.call_depth.load(Ordering::Relaxed)
    }

    /// 0이면 호출 위치를 수집하지 않습니다.
    pub fn set_call_depth(&self, call_depth: u32) {
        self.call_depth.store(call_depth, Ordering::Relaxed);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state(&self) -> LoggerState {
        LoggerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoggerState::Running
    }

    /// 해당 레벨이 최소 레벨 이상인지 확인
    pub fn enabled(&self, level: LogLevel) -> bool {
        level.rank() >= self.level.load(Ordering::Relaxed)
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// 워커 태스크 시작
    ///
    /// 이미 실행 중이거나 tokio 런타임 밖에서 호출되면 아무것도 하지 않고 `false`를 반환합니다.
    pub fn start(&self) -> bool {
        if Handle::try_current().is_err() {
            warn!("tokio 런타임 밖에서 로거 시작 시도, 무시됨");
            return false;
        }

        if self
            .state
            .compare_exchange(STATE_STOPPED, STATE_STARTING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let (sender, receiver) = mpsc::channel(self.capacity);
        let (stop_tx, stop_rx) = oneshot::channel();

        let sinks = std::mem::take(&mut *self.sinks.lock());
        let sink_count = sinks.len();
        let worker = Worker {
            receiver,
            stop: stop_rx,
            sinks,
            formatter: self.formatter.lock().clone(),
            pool: self.pool.clone(),
        };
        let task = tokio::spawn(worker.run());

        *self.worker.lock() = Some(WorkerHandle {
            stop: stop_tx,
            task,
        });
        *self.sender.write() = Some(sender);
        self.state.store(STATE_RUNNING, Ordering::Release);

        debug!(
            capacity = self.capacity,
            sinks = sink_count,
            level = %self.level(),
            "로거 시작됨"
        );
        true
    }

    /// 워커 종료
    ///
    /// 워커가 큐에 남은 레코드를 모두 처리하고 싱크를 플러시한 뒤 종료할 때까지 대기하고,
    /// 이후 큐를 닫고 등록 순서대로 싱크를 닫습니다. 실행 중이 아니면 `false`.
    pub async fn stop(&self) -> bool {
        if self
            .state
            .compare_exchange(
                STATE_RUNNING,
                STATE_SHUTTING_DOWN,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return false;
        }

        let handle = self.worker.lock().take();
        let mut sinks = match handle {
            Some(WorkerHandle { stop, task }) => {
                let _ = stop.send(());
                match task.await {
                    Ok(sinks) => sinks,
                    Err(e) => {
                        error!(error = %e, "로그 워커 태스크 비정상 종료");
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        // 큐 닫기
        self.sender.write().take();

        for sink in sinks.iter_mut() {
            sink.close().await;
        }

        *self.sinks.lock() = sinks;
        self.state.store(STATE_STOPPED, Ordering::Release);

        debug!("로거 종료됨");
        true
    }

    /// 호출 시점까지 큐에 들어온 레코드를 모두 전달하고 싱크를 플러시
    pub async fn flush(&self) {
        let Some(sender) = self.running_sender() else {
            return;
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if sender.send(Command::Flush(ack_tx)).await.is_err() {
            return;
        }
        let _ = ack_rx.await;
    }

    /// 지정 레벨로 메시지 기록
    ///
    /// 실행 중이 아니거나 최소 레벨 미만이면 버려집니다.
    /// 큐가 가득 차면 반환된 future가 빈 자리가 생길 때까지 대기합니다.
    #[track_caller]
    pub fn emit(&self, message: impl AsRef<str>, level: LogLevel) -> impl Future<Output = ()> + '_ {
        let record = self.prepare(message.as_ref(), level, Location::caller());
        self.enqueue(record)
    }

    /// 비동기 컨텍스트 밖의 스레드에서 기록
    ///
    /// 큐가 가득 차면 호출 스레드를 블록합니다. tokio 런타임 워커 스레드에서 호출하면 패닉합니다.
    #[track_caller]
    pub fn blocking_emit(&self, message: impl AsRef<str>, level: LogLevel) {
        let Some(record) = self.prepare(message.as_ref(), level, Location::caller()) else {
            return;
        };
        let Some(sender) = self.running_sender() else {
            self.pool.release(record);
            return;
        };
        if let Err(mpsc::error::SendError(Command::Write(record))) =
            sender.blocking_send(Command::Write(record))
        {
            self.pool.release(record);
        }
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) -> impl Future<Output = ()> + '_ {
        self.emit(message, LogLevel::Debug)
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) -> impl Future<Output = ()> + '_ {
        self.emit(message, LogLevel::Info)
    }

    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>) -> impl Future<Output = ()> + '_ {
        self.emit(message, LogLevel::Warn)
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) -> impl Future<Output = ()> + '_ {
        self.emit(message, LogLevel::Error)
    }

    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>) -> impl Future<Output = ()> + '_ {
        self.emit(message, LogLevel::Fatal)
    }

    /// 레벨/상태 검사 후 풀에서 레코드를 꺼내 채움
    fn prepare(
        &self,
        message: &str,
        level: LogLevel,
        location: &'static Location<'static>,
    ) -> Option<LogRecord> {
        if !self.is_running() || !self.enabled(level) {
            return None;
        }

        let mut record = self.pool.acquire();
        record.level = level;
        record.timestamp = Local::now();
        record.message.push_str(message);
        if self.call_depth() > 0 {
            record.origin_file = Some(location.file());
            record.origin_line = Some(location.line());
        }
        Some(record)
    }

    async fn enqueue(&self, record: Option<LogRecord>) {
        let Some(record) = record else {
            return;
        };
        let Some(sender) = self.running_sender() else {
            self.pool.release(record);
            return;
        };
        // 큐가 닫혔으면 (종료 직후) 레코드는 버려짐
        if let Err(mpsc::error::SendError(Command::Write(record))) =
            sender.send(Command::Write(record)).await
        {
            self.pool.release(record);
        }
    }

    fn running_sender(&self) -> Option<mpsc::Sender<Command>> {
        if !self.is_running() {
            return None;
        }
        self.sender.read().clone()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// 큐의 단일 소비자
struct Worker {
    receiver: mpsc::Receiver<Command>,
    stop: oneshot::Receiver<()>,
    sinks: Sinks,
    formatter: Arc<dyn LogFormatter>,
    pool: Arc<RecordPool>,
}

impl Worker {
    /// 종료 신호를 받을 때까지 레코드 처리. 종료 시 싱크 목록을 돌려줍니다.
    async fn run(mut self) -> Sinks {
        debug!(sinks = self.sinks.len(), "로그 워커 태스크 시작됨");

        loop {
            let command = tokio::select! {
                command = self.receiver.recv() => command,
                _ = &mut self.stop => None,
            };
            match command {
                Some(command) => self.handle(command).await,
                None => break,
            }
        }

        // 남은 레코드 처리 후 종료
        self.drain().await;
        self.flush_sinks().await;

        debug!("로그 워커 태스크 종료");
        self.sinks
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Write(record) => {
                self.dispatch(&record).await;
                self.pool.release(record);
            }
            Command::Flush(ack) => {
                self.flush_sinks().await;
                let _ = ack.send(());
            }
        }
    }

    async fn drain(&mut self) {
        while let Ok(command) = self.receiver.try_recv() {
            self.handle(command).await;
        }
    }

    /// 한 번 포매팅하고 등록 순서대로 모든 싱크에 전달
    ///
    /// 싱크 하나의 실패나 패닉이 다른 싱크나 다음 레코드 처리를 막지 않습니다.
    /// 패닉한 싱크도 목록에 남아 종료 시 `close`가 호출됩니다.
    async fn dispatch(&mut self, record: &LogRecord) {
        if self.sinks.is_empty() {
            return;
        }

        let bytes = self.formatter.format(record);
        for (index, sink) in self.sinks.iter_mut().enumerate() {
            match AssertUnwindSafe(sink.write_msg(&bytes)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(sink = index, error = %e, "로그 싱크 작성 실패"),
                Err(_) => error!(sink = index, "로그 싱크 작성 중 패닉 발생"),
            }
        }
    }

    async fn flush_sinks(&mut self) {
        for (index, sink) in self.sinks.iter_mut().enumerate() {
            if AssertUnwindSafe(sink.flush()).catch_unwind().await.is_err() {
                error!(sink = index, "로그 싱크 플러시 중 패닉 발생");
            }
        }
    }
}
