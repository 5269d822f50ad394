use super::classifier::{KeyClass, KeyClassifier};
use crate::config::Config;
use crate::events::Modifiers;
use std::sync::Arc;

/// Что сделал захват с очередным нажатием
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureAction {
    Ignored,
    Accumulated,
    /// Слово завершено, буфер отдан как кандидат
    Emit(String),
    /// Буфер сброшен без отправки
    Discarded,
}

/// Буфер набираемого слова в активном окне.
pub struct KeyCapture {
    classifier: Arc<KeyClassifier>,
    buffer: Vec<String>,
    ignore_chords: bool,
}

impl KeyCapture {
    pub fn new(classifier: Arc<KeyClassifier>, ignore_chords: bool) -> Self {
        Self {
            classifier,
            buffer: Vec::new(),
            ignore_chords,
        }
    }

    pub fn classifier_from_config(config: &Config) -> Arc<KeyClassifier> {
        Arc::new(KeyClassifier::new(config.extra_stop_keys()))
    }

    /// Обработать символ клавиши с модификаторами из события
    pub fn handle(&mut self, symbol: &str, modifiers: Modifiers) -> CaptureAction {
        if self.ignore_chords && modifiers.has_chord() {
            return CaptureAction::Ignored;
        }

        match self.classifier.classify(symbol) {
            KeyClass::Skip => CaptureAction::Ignored,
            KeyClass::Append => {
                self.buffer.push(symbol.to_string());
                CaptureAction::Accumulated
            }
            KeyClass::Stop => {
                self.buffer.clear();
                CaptureAction::Discarded
            }
            KeyClass::Send => {
                let word = self.buffer.concat();
                self.buffer.clear();
                // Пустое слово не кандидат
                if word.is_empty() {
                    CaptureAction::Discarded
                } else {
                    CaptureAction::Emit(word)
                }
            }
        }
    }

    /// Текущее содержимое буфера
    #[cfg(test)]
    pub fn pending(&self) -> String {
        self.buffer.concat()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
