//! Session: соединение с X-сессией и граница протокола.
//!
//! Всё, что говорит с X-сервером (атомы, маски событий, SendEvent, раскладка),
//! живёт здесь. Классификация клавиш и сопоставление фраз сюда не попадают.

mod dry_run;
mod r#trait;
mod x11;

pub use self::dry_run::{DryRunSession, ScriptStep, SessionLog};
pub use self::r#trait::{create_sessions, Session, SessionPair};
