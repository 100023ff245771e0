//! Система логирования с настройкой уровней через переменные окружения
//! Использует env_logger для гибкого управления логами

use std::env;

/// Инициализация системы логирования
///
/// Уровни логирования настраиваются через переменную окружения RUST_LOG:
/// - RUST_LOG=info - по умолчанию: вход/выход из сделок, итоги прогона
/// - RUST_LOG=debug - смена дня, вето риск-гейта, оценка выходов
///
/// Можно указать для конкретного модуля:
/// - RUST_LOG=kline_backtest::backtest=debug,kline_backtest::strategy=info
pub fn init_logging() {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "info");
        }
    }

    // try_init: повторный вызов (например, из тестов) не паникует
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .format_module_path(true)
        .format_target(false)
        .try_init();

    log::debug!("📝 Log level: {}", get_log_level());
}

/// Получить текущий уровень логирования
pub fn get_log_level() -> String {
    env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}
