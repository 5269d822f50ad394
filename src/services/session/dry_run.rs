use super::r#trait::Session;
use crate::error::Result;
use crate::events::{
    DispatchEvent, KeyCode, KeyEvent, Modifiers, PropertyEvent, SyntheticKeyEvent, WindowId,
};
use crate::mappings::{CharToKeyName, KeysymNames};
use crate::services::keymap::Keymap;
use crate::error::XpanderError;
use crate::xpander_error;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use x11rb::errors::ReplyError;
use x11rb::protocol::ErrorKind;
use x11rb::x11_utils::X11Error;

const FAKE_ROOT: WindowId = WindowId(0x100);
const FAKE_ACTIVE_WINDOW_ATOM: u32 = 0x1a5;

/// Шаг сценария эмулируемой сессии
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Нажатие в окне, которое сейчас в фокусе
    Key(KeyCode, Modifiers),
    /// Смена `_NET_ACTIVE_WINDOW` на следующее окно
    FocusChange,
    /// Событие как есть (чужое окно, SendEvent и т.п.)
    Raw(DispatchEvent),
}

impl ScriptStep {
    /// Нажатия, набирающие текст на данной раскладке
    pub fn text(keymap: &Keymap, text: &str) -> Vec<ScriptStep> {
        text.chars()
            .filter_map(|c| {
                let name = CharToKeyName::translate(c)?;
                let keysym = KeysymNames::translate(&name).ok()?;
                let key_code = *keymap.keycodes_for(keysym).first()?;
                let modifiers = Modifiers::new().with_shift(CharToKeyName::requires_shift(c));
                Some(ScriptStep::Key(key_code, modifiers))
            })
            .collect()
    }

    /// Нажатие именованной клавиши (Escape, Left, ...)
    pub fn key(keymap: &Keymap, name: &str) -> Option<ScriptStep> {
        let keysym = KeysymNames::translate(name).ok()?;
        let key_code = *keymap.keycodes_for(keysym).first()?;
        Some(ScriptStep::Key(key_code, Modifiers::new()))
    }
}

/// Журнал обращений к эмулируемой сессии
#[derive(Debug, Default)]
pub struct SessionLog {
    pub sent: Vec<SyntheticKeyEvent>,
    pub attached: Vec<WindowId>,
    /// Попытки подписки, завершившиеся BadWindow
    pub failed_attaches: Vec<WindowId>,
    pub detached: Vec<WindowId>,
    pub focus_watches: usize,
    pub flushes: usize,
    pub keymap_reloads: usize,
    pub discards: usize,
}

/// Сессия без X-сервера: US-раскладка, фиктивные окна и сценарий нажатий.
/// Синтетические события пишутся в журнал и в лог вместо отправки.
pub struct DryRunSession {
    windows: Vec<WindowId>,
    // Общий для сессий-близнецов: фокус один на всю эмулируемую X-сессию
    focused: Arc<AtomicUsize>,
    active: WindowId,
    keymap: Keymap,
    script: VecDeque<ScriptStep>,
    replay: Option<(Vec<ScriptStep>, Duration)>,
    // Уже доставленные сервером события, читаются раньше сценария
    pending: VecDeque<DispatchEvent>,
    focus_watched: bool,
    attach_calls: usize,
    // Номера вызовов attach, перед которыми фокус уходит на следующее окно
    focus_moves_before_attach: Vec<usize>,
    failing_attaches: usize,
    log: Arc<Mutex<SessionLog>>,
}

impl DryRunSession {
    pub fn new() -> Self {
        Self {
            windows: vec![WindowId(0x1200001), WindowId(0x1400001)],
            focused: Arc::new(AtomicUsize::new(0)),
            active: WindowId::NONE,
            keymap: Keymap::us_layout(),
            script: VecDeque::new(),
            replay: None,
            pending: VecDeque::new(),
            focus_watched: false,
            attach_calls: 0,
            focus_moves_before_attach: Vec::new(),
            failing_attaches: 0,
            log: Arc::new(Mutex::new(SessionLog::default())),
        }
    }

    /// Демонстрационный сценарий для `--dry-run`, повторяется бесконечно
    pub fn demo() -> Self {
        let session = Self::new();
        let keymap = session.keymap.clone();

        let mut steps = ScriptStep::text(&keymap, "brb omw ");
        steps.extend(ScriptStep::text(&keymap, "draft"));
        steps.extend(ScriptStep::key(&keymap, "Escape"));
        steps.extend(ScriptStep::text(&keymap, "ty\n"));
        steps.push(ScriptStep::FocusChange);

        info!("Dry-run режим - X-сессия эмулируется, {} шагов сценария", steps.len());
        session.repeating(steps, Duration::from_millis(500))
    }

    /// Вторая сессия той же эмулируемой X-сессии: общий фокус, без сценария
    pub fn companion(&self) -> Self {
        Self {
            windows: self.windows.clone(),
            focused: Arc::clone(&self.focused),
            keymap: self.keymap.clone(),
            ..Self::new()
        }
    }

    #[cfg(test)]
    pub fn with_windows(mut self, windows: Vec<WindowId>) -> Self {
        if !windows.is_empty() {
            self.windows = windows;
        }
        self
    }

    /// Сценарий, проигрываемый один раз; после него `next_event` возвращает ошибку
    #[cfg(test)]
    pub fn with_script(mut self, steps: Vec<ScriptStep>) -> Self {
        self.script = steps.into();
        self.replay = None;
        self
    }

    /// Фокус уходит на следующее окно между разрешением активного окна и
    /// `attach` с номером `call` (с нуля)
    #[cfg(test)]
    pub fn with_focus_move_before_attach(mut self, call: usize) -> Self {
        self.focus_moves_before_attach.push(call);
        self
    }

    /// Первые `count` вызовов `attach` завершаются BadWindow
    #[cfg(test)]
    pub fn with_failing_attaches(mut self, count: usize) -> Self {
        self.failing_attaches = count;
        self
    }

    fn repeating(mut self, steps: Vec<ScriptStep>, pace: Duration) -> Self {
        self.script = steps.iter().cloned().collect();
        self.replay = Some((steps, pace));
        self
    }

    pub fn log(&self) -> Arc<Mutex<SessionLog>> {
        Arc::clone(&self.log)
    }

    fn focused_window(&self) -> WindowId {
        self.windows[self.focused.load(Ordering::SeqCst) % self.windows.len()]
    }

    /// Сменить `_NET_ACTIVE_WINDOW`. PropertyNotify доходит только при подписке на корень.
    fn move_focus(&mut self) -> Option<DispatchEvent> {
        self.focused.fetch_add(1, Ordering::SeqCst);
        if !self.focus_watched {
            debug!("[DRY RUN] Смена фокуса без подписки на корневое окно");
            return None;
        }
        Some(DispatchEvent::Property(PropertyEvent::new(FAKE_ROOT, FAKE_ACTIVE_WINDOW_ATOM)))
    }

    fn bad_window(window: WindowId) -> XpanderError {
        XpanderError::Reply(ReplyError::X11Error(X11Error {
            error_kind: ErrorKind::Window,
            error_code: 3,
            sequence: 0,
            bad_value: window.value(),
            minor_opcode: 0,
            major_opcode: 2,
            extension_name: None,
            request_name: Some("ChangeWindowAttributes"),
        }))
    }
}

impl Default for DryRunSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for DryRunSession {
    fn root(&self) -> WindowId {
        FAKE_ROOT
    }

    fn active_window(&self) -> WindowId {
        self.active
    }

    fn resolve_active_window(&mut self) -> Result<WindowId> {
        self.active = self.focused_window();
        Ok(self.active)
    }

    fn active_window_atom(&self) -> u32 {
        FAKE_ACTIVE_WINDOW_ATOM
    }

    fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    fn refresh_keymap(&mut self) -> Result<()> {
        self.log.lock().keymap_reloads += 1;
        Ok(())
    }

    fn watch_focus(&mut self) -> Result<()> {
        self.focus_watched = true;
        self.log.lock().focus_watches += 1;
        Ok(())
    }

    fn attach(&mut self, window: WindowId) -> Result<()> {
        let call = self.attach_calls;
        self.attach_calls += 1;

        if self.focus_moves_before_attach.contains(&call) {
            if let Some(event) = self.move_focus() {
                self.pending.push_back(event);
            }
        }

        if call < self.failing_attaches {
            self.log.lock().failed_attaches.push(window);
            return Err(Self::bad_window(window));
        }

        self.log.lock().attached.push(window);
        Ok(())
    }

    fn detach(&mut self, window: WindowId) -> Result<()> {
        self.log.lock().detached.push(window);
        Ok(())
    }

    fn next_event(&mut self) -> Result<DispatchEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(event);
        }

        if self.script.is_empty() {
            match &self.replay {
                Some((steps, _)) => self.script = steps.iter().cloned().collect(),
                None => return Err(xpander_error!(channel, "сценарий dry-run исчерпан")),
            }
        }

        if let Some((_, pace)) = &self.replay {
            std::thread::sleep(*pace);
        }

        loop {
            let step = self
                .script
                .pop_front()
                .ok_or_else(|| xpander_error!(channel, "сценарий dry-run исчерпан"))?;

            match step {
                ScriptStep::Key(key_code, modifiers) => {
                    let window = self.focused_window();
                    return Ok(DispatchEvent::Key(KeyEvent::new(key_code, modifiers, window)));
                }
                ScriptStep::FocusChange => {
                    if let Some(event) = self.move_focus() {
                        return Ok(event);
                    }
                }
                ScriptStep::Raw(event) => return Ok(event),
            }
        }
    }

    fn discard_pending_events(&mut self) -> Result<usize> {
        self.log.lock().discards += 1;
        Ok(0)
    }

    fn send_key_event(&mut self, event: &SyntheticKeyEvent) -> Result<()> {
        info!(
            "[DRY RUN] {:?} {} [{}] -> {}",
            event.state, event.key_code, event.modifiers, event.window
        );
        self.log.lock().sent.push(*event);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.log.lock().flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_text_resolves_shift() {
        let keymap = Keymap::us_layout();
        let steps = ScriptStep::text(&keymap, "Hi!");

        let modifiers: Vec<bool> = steps
            .iter()
            .map(|step| match step {
                ScriptStep::Key(_, m) => m.shift,
                _ => panic!("ожидалось нажатие"),
            })
            .collect();
        assert_eq!(modifiers, vec![true, false, true]);
    }

    #[test]
    fn test_focus_change_moves_to_next_window() {
        let mut session = DryRunSession::new()
            .with_windows(vec![WindowId(1), WindowId(2)])
            .with_script(vec![ScriptStep::FocusChange]);
        session.watch_focus().unwrap();

        assert_eq!(session.resolve_active_window().unwrap(), WindowId(1));
        match session.next_event().unwrap() {
            DispatchEvent::Property(e) => assert_eq!(e.atom, session.active_window_atom()),
            other => panic!("неожиданное событие {:?}", other),
        }
        // Кэш не меняется до явного разрешения
        assert_eq!(session.active_window(), WindowId(1));
        assert_eq!(session.resolve_active_window().unwrap(), WindowId(2));
    }

    #[test]
    fn test_companion_follows_focus() {
        let mut capture = DryRunSession::new()
            .with_windows(vec![WindowId(1), WindowId(2)])
            .with_script(vec![ScriptStep::FocusChange]);
        let mut engine = capture.companion();
        capture.watch_focus().unwrap();

        assert_eq!(engine.resolve_active_window().unwrap(), WindowId(1));
        capture.next_event().unwrap();
        assert_eq!(engine.resolve_active_window().unwrap(), WindowId(2));
        assert!(engine.next_event().is_err());
    }

    #[test]
    fn test_focus_change_is_silent_without_root_subscription() {
        let mut session = DryRunSession::new()
            .with_windows(vec![WindowId(1), WindowId(2)])
            .with_script(vec![ScriptStep::FocusChange]);

        assert!(session.next_event().is_err());
        assert_eq!(session.resolve_active_window().unwrap(), WindowId(2));
    }

    #[test]
    fn test_failing_attach_reports_bad_window() {
        let mut session = DryRunSession::new().with_failing_attaches(1);

        match session.attach(WindowId(7)) {
            Err(XpanderError::Reply(ReplyError::X11Error(e))) => {
                assert_eq!(e.error_kind, ErrorKind::Window);
                assert_eq!(e.bad_value, 7);
            }
            other => panic!("ожидался BadWindow, получено {:?}", other),
        }
        session.attach(WindowId(7)).unwrap();

        let log = session.log();
        assert_eq!(log.lock().failed_attaches, vec![WindowId(7)]);
        assert_eq!(log.lock().attached, vec![WindowId(7)]);
    }

    #[test]
    fn test_exhausted_script_is_an_error() {
        let mut session = DryRunSession::new();
        assert!(session.next_event().is_err());
    }
}
