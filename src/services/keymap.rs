use crate::events::{KeyCode, Modifiers};
use crate::mappings::{KeysymNames, NO_SYMBOL};
use smallvec::SmallVec;

/// Снимок раскладки клавиатуры X-сервера: keycode -> столбцы keysym.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<u32>,
}

impl Keymap {
    pub fn new(min_keycode: u8, keysyms_per_keycode: u8, keysyms: Vec<u32>) -> Self {
        Self {
            min_keycode,
            keysyms_per_keycode: keysyms_per_keycode.max(1),
            keysyms,
        }
    }

    fn columns(&self, key_code: KeyCode) -> Option<&[u32]> {
        let index = key_code.value().checked_sub(self.min_keycode)? as usize;
        let per = self.keysyms_per_keycode as usize;
        self.keysyms.get(index * per..(index + 1) * per)
    }

    /// Все keycode, на которых есть данный keysym, по возрастанию
    pub fn keycodes_for(&self, keysym: u32) -> SmallVec<[KeyCode; 2]> {
        if keysym == NO_SYMBOL {
            return SmallVec::new();
        }

        self.keysyms
            .chunks(self.keysyms_per_keycode as usize)
            .enumerate()
            .filter(|(_, chunk)| chunk.contains(&keysym))
            .filter_map(|(i, _)| u8::try_from(self.min_keycode as usize + i).ok())
            .map(KeyCode)
            .collect()
    }

    /// Keysym для нажатия с учётом Shift, Caps Lock и NumLock (правила первой группы X11)
    pub fn keysym_for(&self, key_code: KeyCode, modifiers: Modifiers) -> u32 {
        let Some(columns) = self.columns(key_code) else {
            return NO_SYMBOL;
        };

        let mut lower = columns.first().copied().unwrap_or(NO_SYMBOL);
        let mut upper = columns.get(1).copied().unwrap_or(NO_SYMBOL);

        // NumLock на цифровом блоке: Shift возвращает навигацию
        if modifiers.num_lock && KeysymNames::is_keypad(upper) {
            return if modifiers.shift { lower } else { upper };
        }

        // Одиночный буквенный keysym описывает обе позиции
        if upper == NO_SYMBOL && is_ascii_letter(lower) {
            lower = to_ascii_lower(lower);
            upper = to_ascii_upper(lower);
        }

        let shifted = if is_ascii_letter(lower) {
            modifiers.shift ^ modifiers.caps_lock
        } else {
            modifiers.shift
        };

        if shifted && upper != NO_SYMBOL {
            upper
        } else {
            lower
        }
    }

    /// Символьное представление нажатия: печатный символ, имя keysym или hex
    pub fn symbol_for(&self, key_code: KeyCode, modifiers: Modifiers) -> Option<String> {
        let keysym = self.keysym_for(key_code, modifiers);
        if keysym == NO_SYMBOL {
            return None;
        }

        if let Some(c) = KeysymNames::printable_char(keysym) {
            return Some(c.to_string());
        }

        Some(
            KeysymNames::reverse_translate(keysym)
                .map(str::to_string)
                .unwrap_or_else(|| format!("0x{:x}", keysym)),
        )
    }

    /// Стандартная US-раскладка (evdev keycodes), используется в dry-run и тестах
    pub fn us_layout() -> Self {
        const MIN: u8 = 8;
        let mut keysyms = vec![NO_SYMBOL; (256 - MIN as usize) * 2];
        let mut set = |code: u8, lower: u32, upper: u32| {
            let index = (code - MIN) as usize * 2;
            keysyms[index] = lower;
            keysyms[index + 1] = upper;
        };

        let row = |chars: &str| chars.chars().map(|c| c as u32).collect::<Vec<_>>();

        for (i, (lower, upper)) in row("1234567890-=").into_iter().zip(row("!@#$%^&*()_+")).enumerate() {
            set(10 + i as u8, lower, upper);
        }
        for (i, (lower, upper)) in row("qwertyuiop[]").into_iter().zip(row("QWERTYUIOP{}")).enumerate() {
            set(24 + i as u8, lower, upper);
        }
        for (i, (lower, upper)) in row("asdfghjkl;'`").into_iter().zip(row("ASDFGHJKL:\"~")).enumerate() {
            set(38 + i as u8, lower, upper);
        }
        set(51, '\\' as u32, '|' as u32);
        for (i, (lower, upper)) in row("zxcvbnm,./").into_iter().zip(row("ZXCVBNM<>?")).enumerate() {
            set(52 + i as u8, lower, upper);
        }

        let named = |name: &str| KeysymNames::translate(name).unwrap_or(NO_SYMBOL);
        for (code, name) in [
            (9, "Escape"),
            (22, "BackSpace"),
            (36, "Return"),
            (37, "Control_L"),
            (50, "Shift_L"),
            (62, "Shift_R"),
            (64, "Alt_L"),
            (65, "space"),
            (66, "Caps_Lock"),
            (77, "Num_Lock"),
            (78, "Scroll_Lock"),
            (92, "ISO_Level3_Shift"),
            (95, "F11"),
            (96, "F12"),
            (104, "KP_Enter"),
            (105, "Control_R"),
            (108, "Alt_R"),
            (110, "Home"),
            (111, "Up"),
            (112, "Prior"),
            (113, "Left"),
            (114, "Right"),
            (115, "End"),
            (116, "Down"),
            (117, "Next"),
            (118, "Insert"),
            (119, "Delete"),
            (133, "Super_L"),
        ] {
            set(code, named(name), NO_SYMBOL);
        }
        set(23, named("Tab"), named("ISO_Left_Tab"));
        for i in 0..10u8 {
            set(67 + i, 0xffbe + i as u32, NO_SYMBOL);
        }
        for (code, navigation, digit) in [
            (79, "KP_Home", '7'),
            (80, "KP_Up", '8'),
            (81, "KP_Prior", '9'),
            (83, "KP_Left", '4'),
            (84, "KP_Begin", '5'),
            (85, "KP_Right", '6'),
            (87, "KP_End", '1'),
            (88, "KP_Down", '2'),
            (89, "KP_Next", '3'),
            (90, "KP_Insert", '0'),
        ] {
            set(code, named(navigation), 0xff80 + digit as u32);
        }
        set(91, named("KP_Delete"), 0xffae);

        Self::new(MIN, 2, keysyms)
    }
}

fn is_ascii_letter(keysym: u32) -> bool {
    matches!(keysym, 0x41..=0x5a | 0x61..=0x7a)
}

fn to_ascii_lower(keysym: u32) -> u32 {
    if (0x41..=0x5a).contains(&keysym) { keysym + 0x20 } else { keysym }
}

fn to_ascii_upper(keysym: u32) -> u32 {
    if (0x61..=0x7a).contains(&keysym) { keysym - 0x20 } else { keysym }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift() -> Modifiers {
        Modifiers::new().with_shift(true)
    }

    #[test]
    fn test_keycodes_for_letters_and_symbols() {
        let keymap = Keymap::us_layout();
        assert_eq!(keymap.keycodes_for('b' as u32).as_slice(), &[KeyCode(56)]);
        // Заглавная буква живёт во втором столбце той же клавиши
        assert_eq!(keymap.keycodes_for('B' as u32).as_slice(), &[KeyCode(56)]);
        assert_eq!(keymap.keycodes_for(0x20).as_slice(), &[KeyCode(65)]);
        assert!(keymap.keycodes_for(0xe9).is_empty());
        assert!(keymap.keycodes_for(NO_SYMBOL).is_empty());
    }

    #[test]
    fn test_keycodes_for_returns_all_matches_in_order() {
        let keymap = Keymap::new(8, 1, vec![0x61, 0x62, 0x61]);
        assert_eq!(keymap.keycodes_for(0x61).as_slice(), &[KeyCode(8), KeyCode(10)]);
    }

    #[test]
    fn test_symbol_for_printable_keys() {
        let keymap = Keymap::us_layout();
        assert_eq!(keymap.symbol_for(KeyCode(56), Modifiers::new()).as_deref(), Some("b"));
        assert_eq!(keymap.symbol_for(KeyCode(56), shift()).as_deref(), Some("B"));
        assert_eq!(keymap.symbol_for(KeyCode(10), shift()).as_deref(), Some("!"));
        assert_eq!(keymap.symbol_for(KeyCode(65), Modifiers::new()).as_deref(), Some(" "));
    }

    #[test]
    fn test_caps_lock_only_affects_letters() {
        let keymap = Keymap::us_layout();
        let caps = Modifiers::new().with_caps_lock(true);
        assert_eq!(keymap.symbol_for(KeyCode(56), caps).as_deref(), Some("B"));
        assert_eq!(keymap.symbol_for(KeyCode(56), caps.with_shift(true)).as_deref(), Some("b"));
        assert_eq!(keymap.symbol_for(KeyCode(10), caps).as_deref(), Some("1"));
    }

    #[test]
    fn test_symbol_for_named_keys() {
        let keymap = Keymap::us_layout();
        assert_eq!(keymap.symbol_for(KeyCode(36), Modifiers::new()).as_deref(), Some("Return"));
        assert_eq!(keymap.symbol_for(KeyCode(9), Modifiers::new()).as_deref(), Some("Escape"));
        assert_eq!(keymap.symbol_for(KeyCode(50), shift()).as_deref(), Some("Shift_L"));
        assert_eq!(keymap.symbol_for(KeyCode(23), shift()).as_deref(), Some("ISO_Left_Tab"));
    }

    #[test]
    fn test_keypad_follows_num_lock() {
        let keymap = Keymap::us_layout();
        let num = Modifiers::new().with_num_lock(true);

        assert_eq!(keymap.symbol_for(KeyCode(83), Modifiers::new()).as_deref(), Some("KP_Left"));
        assert_eq!(keymap.symbol_for(KeyCode(83), num).as_deref(), Some("4"));
        assert_eq!(keymap.symbol_for(KeyCode(83), num.with_shift(true)).as_deref(), Some("KP_Left"));
        assert_eq!(keymap.symbol_for(KeyCode(91), num).as_deref(), Some("."));
        // На обычные клавиши NumLock не влияет
        assert_eq!(keymap.symbol_for(KeyCode(56), num).as_deref(), Some("b"));
        assert_eq!(keymap.symbol_for(KeyCode(92), num).as_deref(), Some("ISO_Level3_Shift"));
    }

    #[test]
    fn test_single_letter_column_expands_case() {
        let keymap = Keymap::new(8, 1, vec!['q' as u32]);
        assert_eq!(keymap.symbol_for(KeyCode(8), shift()).as_deref(), Some("Q"));
        assert_eq!(keymap.symbol_for(KeyCode(8), Modifiers::new()).as_deref(), Some("q"));
    }

    #[test]
    fn test_unknown_keycodes() {
        let keymap = Keymap::us_layout();
        assert_eq!(keymap.symbol_for(KeyCode(7), Modifiers::new()), None);
        assert_eq!(keymap.symbol_for(KeyCode(200), Modifiers::new()), None);

        let exotic = Keymap::new(8, 1, vec![0x1008ff12]);
        assert_eq!(exotic.symbol_for(KeyCode(8), Modifiers::new()).as_deref(), Some("0x1008ff12"));
    }
}
