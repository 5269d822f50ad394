use crate::events::{PropertyEvent, RefreshSignal};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

/// Продолжать ли текущий цикл диспетчеризации
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Канал сигналов обновления ёмкостью 1: повторные сигналы склеиваются
pub fn refresh_channel() -> (mpsc::Sender<RefreshSignal>, mpsc::Receiver<RefreshSignal>) {
    mpsc::channel(1)
}

/// Следит за `_NET_ACTIVE_WINDOW` на корневом окне
pub struct FocusTracker {
    atom: u32,
    refresh_tx: mpsc::Sender<RefreshSignal>,
}

impl FocusTracker {
    pub fn new(atom: u32, refresh_tx: mpsc::Sender<RefreshSignal>) -> Self {
        Self { atom, refresh_tx }
    }

    pub fn handle(&self, event: &PropertyEvent) -> Flow {
        if event.atom != self.atom {
            return Flow::Continue;
        }

        info!("Активное окно сменилось, перезапуск цикла событий");
        match self.refresh_tx.try_send(RefreshSignal) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                // Предыдущий сигнал ещё ждёт движок
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Движок расширений не принимает сигналы обновления");
            }
        }
        Flow::Quit
    }
}
