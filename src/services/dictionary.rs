use crate::error::Result;
use crate::store::DictionaryEntry;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::warn;

/// Источник пар фраза -> расширение для движка
pub trait DictionarySource {
    fn read_dictionary(&self) -> Result<Vec<DictionaryEntry>>;
}

/// Снимок словаря: точное сравнение с учётом регистра
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: HashMap<String, String>,
}

impl Dictionary {
    /// При повторе фразы остаётся первая запись (с меньшим id)
    pub fn from_entries(entries: Vec<DictionaryEntry>) -> Self {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            match map.entry(entry.phrase) {
                Entry::Vacant(slot) => {
                    slot.insert(entry.expansion);
                }
                Entry::Occupied(slot) => {
                    warn!("Фраза '{}' встречается повторно, используется первая запись", slot.key());
                }
            }
        }
        Self { entries: map }
    }

    pub fn load(source: &dyn DictionarySource) -> Result<Self> {
        Ok(Self::from_entries(source.read_dictionary()?))
    }

    pub fn lookup(&self, phrase: &str) -> Option<&str> {
        self.entries.get(phrase).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
