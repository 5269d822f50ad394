use crate::error::Result;
use crate::events::{Modifiers, SyntheticKeyEvent};
use crate::mappings::{CharToKeyName, KeysymNames, BACKSPACE};
use crate::services::session::Session;
use crate::debug_if_enabled;
use tracing::warn;

/// Набор текста синтетическими событиями в активное окно сессии.
pub struct KeyInjector {
    sequence: u16,
}

impl KeyInjector {
    pub fn new() -> Self {
        Self { sequence: 0 }
    }

    fn next_sequence(&mut self) -> u16 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    /// Стереть `count` символов: только нажатия BackSpace, без модификаторов.
    /// Возвращает число отправленных событий.
    pub fn backspace(&mut self, session: &mut dyn Session, count: usize) -> Result<usize> {
        let Some(&key_code) = session.keymap().keycodes_for(BACKSPACE).first() else {
            warn!("В раскладке нет клавиши BackSpace, стирание пропущено");
            return Ok(0);
        };

        let (root, window) = (session.root(), session.active_window());
        for _ in 0..count {
            let event = SyntheticKeyEvent::press(key_code, Modifiers::new(), root, window)
                .with_sequence(self.next_sequence());
            session.send_key_event(&event)?;
        }
        session.flush()?;

        debug_if_enabled!("Отправлено {} BackSpace в {}", count, window);
        Ok(count)
    }

    /// Набрать текст: нажатие и отпускание на каждый символ.
    /// Символы без клавиши в текущей раскладке молча пропускаются.
    /// Возвращает число набранных символов.
    pub fn send_keys(&mut self, session: &mut dyn Session, text: &str) -> Result<usize> {
        let (root, window) = (session.root(), session.active_window());
        let mut typed = 0;

        for c in text.chars() {
            let Some(name) = CharToKeyName::translate(c) else {
                debug_if_enabled!("Символ {:?} не имеет имени клавиши, пропуск", c);
                continue;
            };
            let Ok(keysym) = KeysymNames::translate(&name) else {
                debug_if_enabled!("Имя клавиши '{}' не известно, пропуск", name);
                continue;
            };
            // Несколько keycode на один keysym: печатаем самым младшим
            let Some(&key_code) = session.keymap().keycodes_for(keysym).first() else {
                debug_if_enabled!("Keysym 0x{:x} ('{}') отсутствует в раскладке, пропуск", keysym, name);
                continue;
            };

            let modifiers = Modifiers::new().with_shift(CharToKeyName::requires_shift(c));
            let press = SyntheticKeyEvent::press(key_code, modifiers, root, window)
                .with_sequence(self.next_sequence());
            let release = SyntheticKeyEvent::release(key_code, modifiers, root, window)
                .with_sequence(self.next_sequence());

            session.send_key_event(&press)?;
            session.send_key_event(&release)?;
            typed += 1;
        }
        session.flush()?;

        debug_if_enabled!("Набрано {} из {} символов в {}", typed, text.chars().count(), window);
        Ok(typed)
    }
}

impl Default for KeyInjector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{KeyCode, KeyState, WindowId};
    use crate::services::session::DryRunSession;

    fn session() -> DryRunSession {
        let mut session = DryRunSession::new().with_windows(vec![WindowId(0x42)]);
        session.resolve_active_window().unwrap();
        session
    }

    #[test]
    fn test_backspace_emits_presses_only() {
        let mut session = session();
        let log = session.log();

        let sent = KeyInjector::new().backspace(&mut session, 4).unwrap();

        assert_eq!(sent, 4);
        let log = log.lock();
        assert_eq!(log.sent.len(), 4);
        for event in &log.sent {
            assert_eq!(event.key_code, KeyCode(22));
            assert_eq!(event.state, KeyState::Pressed);
            assert_eq!(event.modifiers.to_mask(), 0);
            assert_eq!(event.window, WindowId(0x42));
            assert_eq!((event.root_x, event.root_y, event.event_x, event.event_y), (0, 0, 0, 0));
            assert!(event.same_screen);
            assert_eq!(event.child, WindowId::NONE);
            assert_eq!(event.time, 0);
        }
        assert_eq!(log.flushes, 1);
    }

    #[test]
    fn test_send_keys_press_release_pairs_with_shift() {
        let mut session = session();
        let log = session.log();

        let typed = KeyInjector::new().send_keys(&mut session, "Hi!").unwrap();

        assert_eq!(typed, 3);
        let log = log.lock();
        let summary: Vec<(u8, KeyState, bool)> = log
            .sent
            .iter()
            .map(|e| (e.key_code.value(), e.state, e.modifiers.shift))
            .collect();
        assert_eq!(
            summary,
            vec![
                (43, KeyState::Pressed, true),
                (43, KeyState::Released, true),
                (31, KeyState::Pressed, false),
                (31, KeyState::Released, false),
                (10, KeyState::Pressed, true),
                (10, KeyState::Released, true),
            ]
        );
    }

    #[test]
    fn test_unresolvable_characters_are_skipped_in_place() {
        let mut session = session();
        let log = session.log();

        let typed = KeyInjector::new().send_keys(&mut session, "a\u{e9}b\u{1F47B}c").unwrap();

        assert_eq!(typed, 3);
        let codes: Vec<u8> = log
            .lock()
            .sent
            .iter()
            .filter(|e| e.state == KeyState::Pressed)
            .map(|e| e.key_code.value())
            .collect();
        assert_eq!(codes, vec![38, 56, 54]);
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let mut session = session();
        let log = session.log();
        let mut injector = KeyInjector::new();

        injector.backspace(&mut session, 1).unwrap();
        injector.send_keys(&mut session, "a").unwrap();

        let sequences: Vec<u16> = log.lock().sent.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }
}
