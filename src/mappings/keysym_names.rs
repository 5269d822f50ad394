use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Keysym для отсутствующего символа (NoSymbol)
pub const NO_SYMBOL: u32 = 0;
pub const BACKSPACE: u32 = 0xff08;
pub const RETURN: u32 = 0xff0d;

// KP_0..KP_9 и KP_Multiply..KP_Divide лежат на 0xff80 выше своих ASCII-символов
const KEYPAD_OFFSET: u32 = 0xff80;
const KP_MULTIPLY: u32 = 0xffaa;
const KP_9: u32 = 0xffb9;

/// Преобразование символьных имён X11 (keysym names) в числовые keysym и обратно.
/// Для печатных ASCII-символов keysym совпадает с кодом символа.
pub struct KeysymNames;

// Канонические имена: обратная трансляция берёт первое имя для keysym
static NAMED_KEYSYMS: &[(&str, u32)] = &[
    // Пунктуация (Latin-1)
    ("space", 0x0020),
    ("exclam", 0x0021),
    ("quotedbl", 0x0022),
    ("numbersign", 0x0023),
    ("dollar", 0x0024),
    ("percent", 0x0025),
    ("ampersand", 0x0026),
    ("apostrophe", 0x0027),
    ("parenleft", 0x0028),
    ("parenright", 0x0029),
    ("asterisk", 0x002a),
    ("plus", 0x002b),
    ("comma", 0x002c),
    ("minus", 0x002d),
    ("period", 0x002e),
    ("slash", 0x002f),
    ("colon", 0x003a),
    ("semicolon", 0x003b),
    ("less", 0x003c),
    ("equal", 0x003d),
    ("greater", 0x003e),
    ("question", 0x003f),
    ("at", 0x0040),
    ("bracketleft", 0x005b),
    ("backslash", 0x005c),
    ("bracketright", 0x005d),
    ("asciicircum", 0x005e),
    ("underscore", 0x005f),
    ("grave", 0x0060),
    ("braceleft", 0x007b),
    ("bar", 0x007c),
    ("braceright", 0x007d),
    ("asciitilde", 0x007e),

    // Редактирование и ввод
    ("BackSpace", BACKSPACE),
    ("Tab", 0xff09),
    ("Return", RETURN),
    ("Pause", 0xff13),
    ("Scroll_Lock", 0xff14),
    ("Escape", 0xff1b),
    ("Delete", 0xffff),
    ("ISO_Left_Tab", 0xfe20),
    ("KP_Enter", 0xff8d),

    // Навигация
    ("Home", 0xff50),
    ("Left", 0xff51),
    ("Up", 0xff52),
    ("Right", 0xff53),
    ("Down", 0xff54),
    ("Prior", 0xff55),
    ("Next", 0xff56),
    ("End", 0xff57),
    ("Print", 0xff61),
    ("Insert", 0xff63),
    ("Menu", 0xff67),
    ("Mode_switch", 0xff7e),
    ("Num_Lock", 0xff7f),

    // Цифровой блок
    ("KP_Home", 0xff95),
    ("KP_Left", 0xff96),
    ("KP_Up", 0xff97),
    ("KP_Right", 0xff98),
    ("KP_Down", 0xff99),
    ("KP_Prior", 0xff9a),
    ("KP_Next", 0xff9b),
    ("KP_End", 0xff9c),
    ("KP_Begin", 0xff9d),
    ("KP_Insert", 0xff9e),
    ("KP_Delete", 0xff9f),

    // Функциональные
    ("F1", 0xffbe),
    ("F2", 0xffbf),
    ("F3", 0xffc0),
    ("F4", 0xffc1),
    ("F5", 0xffc2),
    ("F6", 0xffc3),
    ("F7", 0xffc4),
    ("F8", 0xffc5),
    ("F9", 0xffc6),
    ("F10", 0xffc7),
    ("F11", 0xffc8),
    ("F12", 0xffc9),

    // Модификаторы
    ("Shift_L", 0xffe1),
    ("Shift_R", 0xffe2),
    ("Control_L", 0xffe3),
    ("Control_R", 0xffe4),
    ("Caps_Lock", 0xffe5),
    ("Meta_L", 0xffe7),
    ("Meta_R", 0xffe8),
    ("Alt_L", 0xffe9),
    ("Alt_R", 0xffea),
    ("Super_L", 0xffeb),
    ("Super_R", 0xffec),
    ("ISO_Level3_Shift", 0xfe03),
];

// Синонимы, которые принимаются на вход, но не возвращаются обратной трансляцией
static ALIASES: &[(&str, u32)] = &[
    ("Page_Up", 0xff55),
    ("Page_Down", 0xff56),
    ("KP_Page_Up", 0xff9a),
    ("KP_Page_Down", 0xff9b),
    ("L1", 0xffc8),
    ("L2", 0xffc9),
];

static NAME_TO_KEYSYM: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    NAMED_KEYSYMS
        .iter()
        .chain(ALIASES.iter())
        .copied()
        .collect()
});

static KEYSYM_TO_NAME: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for &(name, keysym) in NAMED_KEYSYMS {
        map.entry(keysym).or_insert(name);
    }
    map
});

impl KeysymNames {
    /// Получить keysym по символьному имени. Имена X11 чувствительны к регистру.
    pub fn translate(name: &str) -> Result<u32, String> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphanumeric() {
                return Ok(c as u32);
            }
        }

        NAME_TO_KEYSYM
            .get(name)
            .copied()
            .ok_or_else(|| format!("Unknown keysym name: {}", name))
    }

    /// Получить каноническое имя keysym
    pub fn reverse_translate(keysym: u32) -> Option<&'static str> {
        KEYSYM_TO_NAME.get(&keysym).copied()
    }

    /// Печатный символ Latin-1 для keysym, если он есть.
    /// Цифры и арифметика цифрового блока печатаются как обычные символы.
    pub fn printable_char(keysym: u32) -> Option<char> {
        match keysym {
            0x0020..=0x007e | 0x00a0..=0x00ff => char::from_u32(keysym),
            KP_MULTIPLY..=KP_9 => char::from_u32(keysym - KEYPAD_OFFSET).filter(|c| {
                c.is_ascii_digit() || matches!(c, '*' | '+' | '-' | '.' | '/')
            }),
            _ => None,
        }
    }

    /// Keysym цифрового блока (KP_Space..KP_Equal)
    pub fn is_keypad(keysym: u32) -> bool {
        (0xff80..=0xffbd).contains(&keysym)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphanumeric_names_are_their_codes() {
        assert_eq!(KeysymNames::translate("a").unwrap(), 0x61);
        assert_eq!(KeysymNames::translate("Z").unwrap(), 0x5a);
        assert_eq!(KeysymNames::translate("7").unwrap(), 0x37);
    }

    #[test]
    fn test_punctuation_translate_and_reverse() {
        assert_eq!(KeysymNames::translate("space").unwrap(), 0x20);
        assert_eq!(KeysymNames::reverse_translate(0x20), Some("space"));
        assert_eq!(KeysymNames::translate("comma").unwrap(), 0x2c);
        assert_eq!(KeysymNames::reverse_translate(0x2c), Some("comma"));
        assert_eq!(KeysymNames::translate("asciitilde").unwrap(), 0x7e);
        assert_eq!(KeysymNames::reverse_translate(0x7e), Some("asciitilde"));
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(KeysymNames::translate("BackSpace").unwrap(), BACKSPACE);
        assert_eq!(KeysymNames::translate("Return").unwrap(), RETURN);
        assert_eq!(KeysymNames::reverse_translate(0xff1b), Some("Escape"));
        assert_eq!(KeysymNames::reverse_translate(0xffe1), Some("Shift_L"));
    }

    #[test]
    fn test_aliases_resolve_to_canonical_names() {
        assert_eq!(KeysymNames::translate("Page_Up").unwrap(), 0xff55);
        assert_eq!(KeysymNames::reverse_translate(0xff55), Some("Prior"));
        assert_eq!(KeysymNames::translate("L2").unwrap(), 0xffc9);
        assert_eq!(KeysymNames::reverse_translate(0xffc9), Some("F12"));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(KeysymNames::translate("backspace").is_err());
        assert!(KeysymNames::translate("no_such_key").is_err());
    }

    #[test]
    fn test_printable_char() {
        assert_eq!(KeysymNames::printable_char(0x20), Some(' '));
        assert_eq!(KeysymNames::printable_char(0x41), Some('A'));
        assert_eq!(KeysymNames::printable_char(0xe9), Some('é'));
        assert_eq!(KeysymNames::printable_char(BACKSPACE), None);
    }

    #[test]
    fn test_keypad_keysyms() {
        assert_eq!(KeysymNames::printable_char(0xffb4), Some('4'));
        assert_eq!(KeysymNames::printable_char(0xffae), Some('.'));
        // KP_Separator не печатается
        assert_eq!(KeysymNames::printable_char(0xffac), None);
        assert_eq!(KeysymNames::reverse_translate(0xff96), Some("KP_Left"));
        assert_eq!(KeysymNames::reverse_translate(0xff9a), Some("KP_Prior"));
        assert!(KeysymNames::is_keypad(0xff96));
        assert!(KeysymNames::is_keypad(0xffb4));
        assert!(!KeysymNames::is_keypad(0xff51));
    }
}
