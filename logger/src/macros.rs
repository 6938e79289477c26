// 포맷 문자열 기반 로깅 매크로
//
// 최소 레벨 검사를 먼저 수행하므로 버려질 메시지는 포매팅하지 않습니다.
// 확장 결과에 `.await`가 포함되어 async 컨텍스트에서만 사용할 수 있습니다.

/// 지정 레벨로 기록
///
/// # Examples
/// ```ignore
/// log_at!(logger, LogLevel::Warn, "queue depth: {}", depth);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger.emit(::std::format!($($arg)+), level).await;
        }
    }};
}

/// Debug 레벨 기록
///
/// # Examples
/// ```ignore
/// log_debug!(logger, "cache miss: {}", key);
/// ```
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Info 레벨 기록
///
/// # Examples
/// ```ignore
/// log_info!(logger, "info Msg, value:{}", 1);
/// ```
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Warn 레벨 기록
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Error 레벨 기록
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Fatal 레벨 기록
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
