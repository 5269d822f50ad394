//! KeyCapture: буфер набираемого слова и классификация клавиш.
//!
//! Здесь нет обращений к X-серверу: на вход приходят уже разрешённые символы.
//! Решение о совпадении фразы принимает только движок расширений.

mod classifier;
mod key_capture;

pub use self::classifier::{KeyClassifier, SEND_KEYS};
pub use self::key_capture::{CaptureAction, KeyCapture};
