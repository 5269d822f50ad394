use crate::error::{Result, XpanderError};
use crate::events::{DispatchEvent, KeyEvent, RefreshSignal, WindowId};
use crate::services::focus_tracker::{FocusTracker, Flow};
use crate::services::handoff::HandoffSender;
use crate::services::key_capture::{CaptureAction, KeyCapture, KeyClassifier};
use crate::services::session::Session;
use crate::{debug_if_enabled, trace_if_enabled};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use x11rb::errors::ReplyError;

const REATTACH_DELAY: Duration = Duration::from_millis(50);

/// Внешний цикл захвата: разрешить окно, подписаться, слушать до смены фокуса,
/// отписаться и начать заново. Блокирующий, запускается в отдельном потоке.
pub struct SessionSupervisor {
    session: Box<dyn Session + Send>,
    classifier: Arc<KeyClassifier>,
    ignore_chords: bool,
    log_keys: bool,
    candidates: HandoffSender<String>,
    refresh_tx: mpsc::Sender<RefreshSignal>,
}

/// Обработчики одной итерации: буфер слова и слежение за фокусом
struct Listener {
    window: WindowId,
    capture: KeyCapture,
    focus: FocusTracker,
}

impl SessionSupervisor {
    pub fn new(
        session: Box<dyn Session + Send>,
        classifier: Arc<KeyClassifier>,
        ignore_chords: bool,
        log_keys: bool,
        candidates: HandoffSender<String>,
        refresh_tx: mpsc::Sender<RefreshSignal>,
    ) -> Self {
        Self {
            session,
            classifier,
            ignore_chords,
            log_keys,
            candidates,
            refresh_tx,
        }
    }

    /// Возвращается только с фатальной ошибкой
    pub fn run(&mut self) -> Result<()> {
        info!("SessionSupervisor запущен");
        self.session.watch_focus()?;

        loop {
            let Some(window) = self.bootstrap()? else {
                std::thread::sleep(REATTACH_DELAY);
                continue;
            };

            let mut listener = self.listener(window);
            self.listen(&mut listener)?;
            if !listener.capture.is_empty() {
                debug_if_enabled!("Незавершённое слово отброшено при смене окна");
            }

            self.tear_down(window)?;
        }
    }

    /// Разрешить активное окно и подписаться на события.
    /// `None`, если окно исчезло до подписки.
    fn bootstrap(&mut self) -> Result<Option<WindowId>> {
        let window = self.session.resolve_active_window()?;

        match self.session.attach(window) {
            Ok(()) => {
                info!("Слушаем активное окно {}", window);
                Ok(Some(window))
            }
            Err(XpanderError::Reply(ReplyError::X11Error(e))) => {
                warn!("Не удалось подписаться на {}: {:?}, повтор", window, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn listener(&self, window: WindowId) -> Listener {
        Listener {
            window,
            capture: KeyCapture::new(Arc::clone(&self.classifier), self.ignore_chords),
            focus: FocusTracker::new(self.session.active_window_atom(), self.refresh_tx.clone()),
        }
    }

    /// Цикл диспетчеризации до сигнала смены фокуса
    fn listen(&mut self, listener: &mut Listener) -> Result<()> {
        loop {
            let flow = match self.session.next_event()? {
                DispatchEvent::Key(event) => self.on_key(listener, &event)?,
                DispatchEvent::Property(event) => listener.focus.handle(&event),
            };

            if flow == Flow::Quit {
                return Ok(());
            }
        }
    }

    fn on_key(&self, listener: &mut Listener, event: &KeyEvent) -> Result<Flow> {
        // Собственные синтетические события и хвосты от прошлого окна
        if event.synthetic || event.window != listener.window {
            trace_if_enabled!("Пропуск нажатия {}", event);
            return Ok(Flow::Continue);
        }

        let Some(symbol) = self.session.keymap().symbol_for(event.key_code, event.modifiers) else {
            trace_if_enabled!("Нет символа для {}", event.key_code);
            return Ok(Flow::Continue);
        };

        if self.log_keys {
            info!("Клавиша: {:?} [{}]", symbol, event.modifiers);
        } else {
            trace_if_enabled!("Клавиша: {:?} [{}]", symbol, event.modifiers);
        }

        match listener.capture.handle(&symbol, event.modifiers) {
            CaptureAction::Emit(word) => {
                if self.log_keys {
                    info!("Отправка кандидата: {:?}", word);
                }
                self.candidates.send_blocking(word)?;
            }
            CaptureAction::Discarded => {
                debug_if_enabled!("Буфер сброшен клавишей {:?}", symbol);
            }
            CaptureAction::Accumulated | CaptureAction::Ignored => {}
        }

        Ok(Flow::Continue)
    }

    fn tear_down(&mut self, window: WindowId) -> Result<()> {
        self.session.detach(window)?;
        debug_if_enabled!("Подписки на {} сняты", window);
        Ok(())
    }
}
