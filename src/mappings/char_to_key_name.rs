use std::borrow::Cow;

/// Преобразование символов текста расширения в символьные имена клавиш X11.
/// Буквы и цифры называются сами собой, пробел и пунктуация идут через таблицу имён.
pub struct CharToKeyName;

impl CharToKeyName {
    /// Получить имя клавиши для символа; `None` для символов без клавиши
    pub fn translate(c: char) -> Option<Cow<'static, str>> {
        if c.is_ascii_alphanumeric() {
            return Some(Cow::Owned(c.to_string()));
        }

        let name = match c {
            ' ' => "space",
            '\n' => "Return",
            '\t' => "Tab",
            '!' => "exclam",
            '"' => "quotedbl",
            '#' => "numbersign",
            '$' => "dollar",
            '%' => "percent",
            '&' => "ampersand",
            '\'' => "apostrophe",
            '(' => "parenleft",
            ')' => "parenright",
            '*' => "asterisk",
            '+' => "plus",
            ',' => "comma",
            '-' => "minus",
            '.' => "period",
            '/' => "slash",
            ':' => "colon",
            ';' => "semicolon",
            '<' => "less",
            '=' => "equal",
            '>' => "greater",
            '?' => "question",
            '@' => "at",
            '[' => "bracketleft",
            '\\' => "backslash",
            ']' => "bracketright",
            '^' => "asciicircum",
            '_' => "underscore",
            '`' => "grave",
            '{' => "braceleft",
            '|' => "bar",
            '}' => "braceright",
            '~' => "asciitilde",
            _ => return None,
        };

        Some(Cow::Borrowed(name))
    }

    /// Нужен ли Shift, чтобы набрать символ на US-раскладке
    pub fn requires_shift(c: char) -> bool {
        c.is_ascii_uppercase()
            || matches!(
                c,
                '~' | '!' | '@' | '#' | '$' | '%' | '^' | '&' | '*' | '(' | ')' | '_' | '+'
                    | '{' | '}' | '|' | ':' | '"' | '<' | '>' | '?'
            )
    }
}
