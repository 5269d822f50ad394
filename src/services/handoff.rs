use crate::error::Result;
use crate::xpander_error;
use tokio::sync::{mpsc, oneshot};

type Envelope<T> = (T, oneshot::Sender<()>);

/// Передача «из рук в руки»: отправитель ждёт, пока получатель заберёт значение.
/// В полёте не больше одного значения.
pub fn handoff<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (tx, rx) = mpsc::channel(1);
    (HandoffSender { tx }, HandoffReceiver { rx })
}

pub struct HandoffSender<T> {
    tx: mpsc::Sender<Envelope<T>>,
}

impl<T> HandoffSender<T> {
    /// Блокирующая отправка для синхронных потоков (цикл событий X11).
    /// Нельзя вызывать внутри асинхронного контекста.
    pub fn send_blocking(&self, value: T) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .blocking_send((value, ack_tx))
            .map_err(|_| xpander_error!(channel, "получатель кандидатов завершён"))?;
        ack_rx
            .blocking_recv()
            .map_err(|_| xpander_error!(channel, "кандидат не был принят"))
    }

    #[cfg(test)]
    pub async fn send(&self, value: T) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send((value, ack_tx))
            .await
            .map_err(|_| xpander_error!(channel, "получатель кандидатов завершён"))?;
        ack_rx
            .await
            .map_err(|_| xpander_error!(channel, "кандидат не был принят"))
    }
}

impl<T> Clone for HandoffSender<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

pub struct HandoffReceiver<T> {
    rx: mpsc::Receiver<Envelope<T>>,
}

impl<T> HandoffReceiver<T> {
    /// Забрать значение и сразу подтвердить получение. `None`, когда все отправители закрыты.
    pub async fn recv(&mut self) -> Option<T> {
        let (value, ack) = self.rx.recv().await?;
        // Отправитель мог уже сдаться, подтверждать некому
        let _ = ack.send(());
        Some(value)
    }
}
