use serde::Serialize;
use std::fmt;

/// Категория: группа расширений
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Расширение: текст, подставляемый вместо фразы
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expansion {
    pub id: i64,
    pub name: String,
    pub text: String,
    pub category_id: i64,
}

/// Фраза-триггер, ссылается ровно на одно расширение
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phrase {
    pub id: i64,
    pub name: String,
    pub expansion_id: i64,
}

/// Плоская пара для движка: фраза и текст её расширения
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionaryEntry {
    pub phrase: String,
    pub expansion: String,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{}): {:?}", self.name, self.id, self.text)
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

impl fmt::Display for DictionaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {:?}", self.phrase, self.expansion)
    }
}
