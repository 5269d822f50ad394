use std::collections::HashSet;

/// Клавиши, которые не влияют на буфер
pub const SKIP_KEYS: &[&str] = &["Shift_L", "Shift_R"];

/// Клавиши, сбрасывающие буфер без отправки
pub const STOP_KEYS: &[&str] = &[
    // Навигация
    "Up", "Down", "Left", "Right", "Prior", "Page_Up", "Next", "Page_Down", "Home", "End",
    "KP_Up", "KP_Down", "KP_Left", "KP_Right", "KP_Prior", "KP_Next", "KP_Home", "KP_End",
    "KP_Begin",
    // Удаление
    "BackSpace", "Delete", "KP_Delete",
    // Модификаторы
    "Control_L", "Control_R", "Alt_L", "Alt_R", "Meta_L", "Meta_R", "Super_L", "Super_R",
    "ISO_Level3_Shift", "Mode_switch",
    // Фиксация регистра
    "Caps_Lock", "Num_Lock", "Scroll_Lock",
    // Функциональные
    "Escape", "Print", "Pause", "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10",
    "F11", "F12", "L1", "L2",
];

/// Клавиши, завершающие слово
pub const SEND_KEYS: &[&str] = &[" ", "Tab", "ISO_Left_Tab", "Return", "KP_Enter"];

/// Класс нажатой клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    Skip,
    Stop,
    Send,
    Append,
}

/// Три непересекающихся множества символов клавиш
#[derive(Debug, Clone)]
pub struct KeyClassifier {
    skip: HashSet<String>,
    stop: HashSet<String>,
    send: HashSet<String>,
}

impl KeyClassifier {
    /// Дополнительные стоп-клавиши вытесняют одноимённые из skip
    pub fn new<'a>(extra_stop_keys: impl IntoIterator<Item = &'a String>) -> Self {
        let send: HashSet<String> = SEND_KEYS.iter().map(|k| k.to_string()).collect();

        let mut stop: HashSet<String> = STOP_KEYS.iter().map(|k| k.to_string()).collect();
        stop.extend(
            extra_stop_keys
                .into_iter()
                .filter(|key| !send.contains(key.as_str()))
                .cloned(),
        );

        let skip = SKIP_KEYS
            .iter()
            .map(|k| k.to_string())
            .filter(|key| !stop.contains(key))
            .collect();

        Self { skip, stop, send }
    }

    pub fn classify(&self, symbol: &str) -> KeyClass {
        if self.skip.contains(symbol) {
            KeyClass::Skip
        } else if self.send.contains(symbol) {
            KeyClass::Send
        } else if self.stop.contains(symbol) {
            KeyClass::Stop
        } else {
            KeyClass::Append
        }
    }
}

impl Default for KeyClassifier {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classes() {
        let classifier = KeyClassifier::default();

        assert_eq!(classifier.classify("Shift_L"), KeyClass::Skip);
        assert_eq!(classifier.classify("Shift_R"), KeyClass::Skip);
        assert_eq!(classifier.classify("Caps_Lock"), KeyClass::Stop);
        assert_eq!(classifier.classify("Num_Lock"), KeyClass::Stop);
        assert_eq!(classifier.classify("ISO_Level3_Shift"), KeyClass::Stop);
        assert_eq!(classifier.classify("KP_Left"), KeyClass::Stop);
        assert_eq!(classifier.classify(" "), KeyClass::Send);
        assert_eq!(classifier.classify("Return"), KeyClass::Send);
        assert_eq!(classifier.classify("Tab"), KeyClass::Send);
        assert_eq!(classifier.classify("Escape"), KeyClass::Stop);
        assert_eq!(classifier.classify("BackSpace"), KeyClass::Stop);
        assert_eq!(classifier.classify("Prior"), KeyClass::Stop);
        assert_eq!(classifier.classify("a"), KeyClass::Append);
        assert_eq!(classifier.classify(","), KeyClass::Append);
        assert_eq!(classifier.classify("Insert"), KeyClass::Append);
    }

    #[test]
    fn test_default_sets_are_disjoint() {
        for key in SKIP_KEYS {
            assert!(!STOP_KEYS.contains(key) && !SEND_KEYS.contains(key));
        }
        for key in STOP_KEYS {
            assert!(!SEND_KEYS.contains(key));
        }
    }

    #[test]
    fn test_extra_stop_keys() {
        let extra = vec!["Insert".to_string(), "Shift_L".to_string(), " ".to_string()];
        let classifier = KeyClassifier::new(&extra);

        assert_eq!(classifier.classify("Insert"), KeyClass::Stop);
        assert_eq!(classifier.classify("Shift_L"), KeyClass::Stop);
        assert_eq!(classifier.classify("Shift_R"), KeyClass::Skip);
        // Терминатор не превращается в стоп-клавишу
        assert_eq!(classifier.classify(" "), KeyClass::Send);
    }
}
