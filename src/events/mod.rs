pub mod keyboard;
pub mod window;

pub use keyboard::{KeyCode, KeyEvent, KeyState, Modifiers};
pub use window::{PropertyEvent, RefreshSignal, WindowId};

/// Событие из цикла диспетчеризации X11, уже приведённое к нашим типам
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    Key(KeyEvent),
    Property(PropertyEvent),
}

/// Синтетическое событие клавиатуры для инъекции через SendEvent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticKeyEvent {
    pub sequence: u16,
    /// CurrentTime (0): сервер подставит своё время
    pub time: u32,
    pub root: WindowId,
    pub window: WindowId,
    pub child: WindowId,
    pub root_x: i16,
    pub root_y: i16,
    pub event_x: i16,
    pub event_y: i16,
    pub modifiers: Modifiers,
    pub same_screen: bool,
    pub key_code: KeyCode,
    pub state: KeyState,
}

impl SyntheticKeyEvent {
    pub fn new(
        key_code: KeyCode,
        state: KeyState,
        modifiers: Modifiers,
        root: WindowId,
        window: WindowId,
    ) -> Self {
        Self {
            sequence: 0,
            time: 0,
            root,
            window,
            child: WindowId::NONE,
            root_x: 0,
            root_y: 0,
            event_x: 0,
            event_y: 0,
            modifiers,
            same_screen: true,
            key_code,
            state,
        }
    }

    pub fn press(key_code: KeyCode, modifiers: Modifiers, root: WindowId, window: WindowId) -> Self {
        Self::new(key_code, KeyState::Pressed, modifiers, root, window)
    }

    pub fn release(key_code: KeyCode, modifiers: Modifiers, root: WindowId, window: WindowId) -> Self {
        Self::new(key_code, KeyState::Released, modifiers, root, window)
    }

    pub fn with_sequence(mut self, sequence: u16) -> Self {
        self.sequence = sequence;
        self
    }
}
