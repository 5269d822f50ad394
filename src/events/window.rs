use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор окна X11
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl WindowId {
    /// Отсутствие окна (None в протоколе X11)
    pub const NONE: WindowId = WindowId(0);

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Уведомление об изменении свойства окна
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEvent {
    pub window: WindowId,
    pub atom: u32,
    pub timestamp: std::time::Instant,
}

impl PropertyEvent {
    pub fn new(window: WindowId, atom: u32) -> Self {
        Self {
            window,
            atom,
            timestamp: std::time::Instant::now(),
        }
    }
}

impl fmt::Display for PropertyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PropertyNotify atom={} на {} ({}ms ago)",
            self.atom,
            self.window,
            self.timestamp.elapsed().as_millis()
        )
    }
}

/// Сигнал движку расширений: активное окно сменилось
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSignal;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_id_display_and_none() {
        assert_eq!(WindowId(0x3a00007).to_string(), "0x3a00007");
        assert!(WindowId::NONE.is_none());
        assert!(!WindowId(1).is_none());
    }
}
