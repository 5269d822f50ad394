use crate::config::Config;
use crate::error::Result;
use crate::events::{DispatchEvent, SyntheticKeyEvent, WindowId};
use crate::services::keymap::Keymap;

/// Соединение с X-сессией: корневое окно, активное окно и раскладка.
///
/// Каждый актор (движок расширений и супервизор захвата) владеет своей сессией
/// и обновляет её сам; общих изменяемых ссылок на сессию нет.
pub trait Session {
    /// Корневое окно экрана
    fn root(&self) -> WindowId;

    /// Последнее разрешённое активное окно
    fn active_window(&self) -> WindowId;

    /// Перечитать свойство `_NET_ACTIVE_WINDOW` корневого окна
    fn resolve_active_window(&mut self) -> Result<WindowId>;

    /// Атом `_NET_ACTIVE_WINDOW`, по которому фильтруются PropertyNotify
    fn active_window_atom(&self) -> u32;

    fn keymap(&self) -> &Keymap;

    /// Перечитать раскладку клавиатуры с сервера
    fn refresh_keymap(&mut self) -> Result<()>;

    /// Подписаться на PropertyChange корневого окна. Подписка действует до конца
    /// соединения, поэтому смена фокуса между `detach` и `attach` не теряется.
    fn watch_focus(&mut self) -> Result<()>;

    /// Подписаться на KeyPress окна
    fn attach(&mut self, window: WindowId) -> Result<()>;

    /// Снять подписку, выставленную `attach`
    fn detach(&mut self, window: WindowId) -> Result<()>;

    /// Блокирующее ожидание следующего интересного события
    fn next_event(&mut self) -> Result<DispatchEvent>;

    /// Выбросить уже полученные события и асинхронные ошибки, не блокируясь.
    /// Возвращает число выброшенных.
    fn discard_pending_events(&mut self) -> Result<usize>;

    /// Отправить синтетическое событие клавиши (без ожидания доставки)
    fn send_key_event(&mut self, event: &SyntheticKeyEvent) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

/// Сессии для двух акторов: цикла захвата и движка расширений
pub struct SessionPair {
    pub capture: Box<dyn Session + Send>,
    pub engine: Box<dyn Session + Send>,
}

/// Factory function to create both sessions based on the dry_run flag.
/// Каждый актор получает собственное соединение.
pub fn create_sessions(config: &Config, dry_run: bool) -> Result<SessionPair> {
    if dry_run {
        let capture = super::dry_run::DryRunSession::demo();
        let engine = capture.companion();
        Ok(SessionPair {
            capture: Box::new(capture),
            engine: Box::new(engine),
        })
    } else {
        let display = config.session.display.as_deref();
        Ok(SessionPair {
            capture: Box::new(super::x11::X11Session::connect(display)?),
            engine: Box::new(super::x11::X11Session::connect(display)?),
        })
    }
}
