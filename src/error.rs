use thiserror::Error;

#[derive(Error, Debug)]
pub enum XpanderError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Не удалось подключиться к X-серверу: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("Соединение с X-сервером потеряно: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("Ошибка ответа X-сервера: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error("Ошибка хранилища словаря: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Активное окно не определено: {0}")]
    ActiveWindow(String),

    #[error("Канал закрыт: {0}")]
    Channel(String),

    #[error("Запись не найдена: {0}")]
    NotFound(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl XpanderError {
    pub fn not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(XpanderError::NotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, XpanderError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! xpander_error {
    (channel, $($arg:tt)*) => {
        $crate::error::XpanderError::Channel(format!($($arg)*))
    };
    (active_window, $($arg:tt)*) => {
        $crate::error::XpanderError::ActiveWindow(format!($($arg)*))
    };
    (not_found, $($arg:tt)*) => {
        $crate::error::XpanderError::NotFound(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::XpanderError::Internal(format!($($arg)*))
    };
}
