use super::r#trait::Session;
use crate::error::Result;
use crate::events::{
    DispatchEvent, KeyCode, KeyEvent, KeyState, Modifiers, PropertyEvent, SyntheticKeyEvent,
    WindowId,
};
use crate::services::keymap::Keymap;
use crate::{trace_if_enabled, xpander_error};
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    AtomEnum, ChangeWindowAttributesAux, ConnectionExt, EventMask, KeyButMask, KeyPressEvent,
    KEY_PRESS_EVENT, KEY_RELEASE_EVENT,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

const NET_ACTIVE_WINDOW: &[u8] = b"_NET_ACTIVE_WINDOW";

// Бит 0x80 в response_type: событие пришло через SendEvent
const SENT_EVENT_FLAG: u8 = 0x80;

pub struct X11Session {
    conn: RustConnection,
    root: WindowId,
    active: WindowId,
    active_window_atom: u32,
    keymap: Keymap,
}

impl X11Session {
    /// Подключиться к X-серверу и разрешить корневое и активное окна
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(display)?;

        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| WindowId(screen.root))
            .ok_or_else(|| xpander_error!(internal, "Экран {} отсутствует в setup", screen_num))?;

        let active_window_atom = conn.intern_atom(false, NET_ACTIVE_WINDOW)?.reply()?.atom;
        let keymap = Self::load_keymap(&conn)?;

        let mut session = Self {
            conn,
            root,
            active: WindowId::NONE,
            active_window_atom,
            keymap,
        };
        session.resolve_active_window()?;

        info!(
            "Подключено к X-серверу: экран {}, корневое окно {}, активное окно {}",
            screen_num, session.root, session.active
        );
        Ok(session)
    }

    fn load_keymap(conn: &RustConnection) -> Result<Keymap> {
        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let count = setup.max_keycode - min_keycode + 1;

        let mapping = conn.get_keyboard_mapping(min_keycode, count)?.reply()?;
        debug!(
            "Раскладка загружена: {} keycode, {} keysym на keycode",
            count, mapping.keysyms_per_keycode
        );

        Ok(Keymap::new(min_keycode, mapping.keysyms_per_keycode, mapping.keysyms))
    }

    fn set_event_mask(&self, window: WindowId, mask: EventMask) -> Result<()> {
        self.conn
            .change_window_attributes(window.value(), &ChangeWindowAttributesAux::new().event_mask(mask))?
            .check()?;
        Ok(())
    }
}

impl Session for X11Session {
    fn root(&self) -> WindowId {
        self.root
    }

    fn active_window(&self) -> WindowId {
        self.active
    }

    fn resolve_active_window(&mut self) -> Result<WindowId> {
        let reply = self
            .conn
            .get_property(false, self.root.value(), self.active_window_atom, AtomEnum::WINDOW, 0, 1)?
            .reply()?;

        let window = reply
            .value32()
            .and_then(|mut values| values.next())
            .map(WindowId)
            .ok_or_else(|| {
                xpander_error!(
                    active_window,
                    "свойство _NET_ACTIVE_WINDOW на {} не прочитано",
                    self.root
                )
            })?;

        self.active = window;
        Ok(window)
    }

    fn active_window_atom(&self) -> u32 {
        self.active_window_atom
    }

    fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    fn refresh_keymap(&mut self) -> Result<()> {
        self.keymap = Self::load_keymap(&self.conn)?;
        Ok(())
    }

    fn watch_focus(&mut self) -> Result<()> {
        self.set_event_mask(self.root, EventMask::PROPERTY_CHANGE)?;
        debug!("Подписка на PropertyChange {}", self.root);
        Ok(())
    }

    fn attach(&mut self, window: WindowId) -> Result<()> {
        if !window.is_none() {
            self.set_event_mask(window, EventMask::KEY_PRESS)?;
            debug!("Подписка на KeyPress {}", window);
        }
        Ok(())
    }

    fn detach(&mut self, window: WindowId) -> Result<()> {
        if window.is_none() {
            return Ok(());
        }
        // Окно могло уже исчезнуть
        if let Err(e) = self.set_event_mask(window, EventMask::NO_EVENT) {
            debug!("Не удалось снять подписку с {}: {}", window, e);
        }
        Ok(())
    }

    fn next_event(&mut self) -> Result<DispatchEvent> {
        loop {
            match self.conn.wait_for_event()? {
                Event::KeyPress(e) => {
                    let event = KeyEvent::new(
                        KeyCode(e.detail),
                        Modifiers::from_mask(u16::from(e.state)),
                        WindowId(e.event),
                    )
                    .synthetic(e.response_type & SENT_EVENT_FLAG != 0);
                    return Ok(DispatchEvent::Key(event));
                }
                Event::PropertyNotify(e) => {
                    return Ok(DispatchEvent::Property(PropertyEvent::new(WindowId(e.window), e.atom)));
                }
                Event::Error(e) => {
                    warn!("Ошибка X11 в цикле событий: {:?}", e);
                }
                other => {
                    trace_if_enabled!("Пропуск события {:?}", other);
                }
            }
        }
    }

    fn discard_pending_events(&mut self) -> Result<usize> {
        let mut discarded = 0;
        while let Some(event) = self.conn.poll_for_event()? {
            if let Event::Error(e) = event {
                debug!("Отложенная ошибка X11: {:?}", e);
            }
            discarded += 1;
        }
        Ok(discarded)
    }

    fn send_key_event(&mut self, event: &SyntheticKeyEvent) -> Result<()> {
        let response_type = match event.state {
            KeyState::Pressed => KEY_PRESS_EVENT,
            KeyState::Released => KEY_RELEASE_EVENT,
        };

        let raw = KeyPressEvent {
            response_type,
            detail: event.key_code.value(),
            sequence: event.sequence,
            time: event.time,
            root: event.root.value(),
            event: event.window.value(),
            child: event.child.value(),
            root_x: event.root_x,
            root_y: event.root_y,
            event_x: event.event_x,
            event_y: event.event_y,
            state: KeyButMask::from(event.modifiers.to_mask()),
            same_screen: event.same_screen,
        };

        // Пустая маска: событие получает клиент, создавший окно
        self.conn
            .send_event(false, event.window.value(), EventMask::NO_EVENT, raw)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}
