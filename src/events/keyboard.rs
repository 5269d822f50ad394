use super::window::WindowId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Физический код клавиши (X11 keycode, 8..=255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u8);

impl KeyCode {
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "keycode {}", self.0)
    }
}

// Биты маски состояния из протокола X11
const SHIFT_MASK: u16 = 1 << 0;
const LOCK_MASK: u16 = 1 << 1;
const CONTROL_MASK: u16 = 1 << 2;
const MOD1_MASK: u16 = 1 << 3;
const MOD2_MASK: u16 = 1 << 4;
const MOD4_MASK: u16 = 1 << 6;

/// Модификаторы клавиш
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub caps_lock: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub super_key: bool,
    /// NumLock (Mod2): выбор столбца для цифрового блока
    pub num_lock: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    #[cfg(test)]
    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    #[cfg(test)]
    pub fn with_caps_lock(mut self, caps_lock: bool) -> Self {
        self.caps_lock = caps_lock;
        self
    }

    #[cfg(test)]
    pub fn with_num_lock(mut self, num_lock: bool) -> Self {
        self.num_lock = num_lock;
        self
    }

    /// Разобрать поле `state` события X11. Прочие биты (Mod3, Mod5, кнопки) игнорируются.
    pub fn from_mask(mask: u16) -> Self {
        Self {
            shift: mask & SHIFT_MASK != 0,
            caps_lock: mask & LOCK_MASK != 0,
            ctrl: mask & CONTROL_MASK != 0,
            alt: mask & MOD1_MASK != 0,
            super_key: mask & MOD4_MASK != 0,
            num_lock: mask & MOD2_MASK != 0,
        }
    }

    pub fn to_mask(&self) -> u16 {
        let mut mask = 0;
        if self.shift { mask |= SHIFT_MASK; }
        if self.caps_lock { mask |= LOCK_MASK; }
        if self.ctrl { mask |= CONTROL_MASK; }
        if self.alt { mask |= MOD1_MASK; }
        if self.super_key { mask |= MOD4_MASK; }
        if self.num_lock { mask |= MOD2_MASK; }
        mask
    }

    /// Зажат ли модификатор аккорда (Ctrl, Alt или Super)
    pub fn has_chord(&self) -> bool {
        self.ctrl || self.alt || self.super_key
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        let mut result = Vec::new();
        if self.ctrl { result.push("ctrl"); }
        if self.alt { result.push("alt"); }
        if self.shift { result.push("shift"); }
        if self.caps_lock { result.push("lock"); }
        if self.super_key { result.push("super"); }
        if self.num_lock { result.push("num"); }
        result
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Нажатие клавиши, полученное с активного окна
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    pub modifiers: Modifiers,
    pub window: WindowId,
    /// Событие пришло через SendEvent (в том числе от нас самих)
    pub synthetic: bool,
    pub timestamp: std::time::Instant,
}

impl KeyEvent {
    pub fn new(key_code: KeyCode, modifiers: Modifiers, window: WindowId) -> Self {
        Self {
            key_code,
            modifiers,
            window,
            synthetic: false,
            timestamp: std::time::Instant::now(),
        }
    }

    pub fn synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {} ({}ms)",
            self.key_code,
            self.modifiers,
            self.window,
            self.timestamp.elapsed().as_millis()
        )
    }
}
