use crate::error::Result;
use crate::events::RefreshSignal;
use crate::services::dictionary::{Dictionary, DictionarySource};
use crate::services::handoff::HandoffReceiver;
use crate::services::key_injector::KeyInjector;
use crate::services::session::Session;
use crate::debug_if_enabled;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Движок расширений: владеет снимком словаря и своей сессией,
/// принимает кандидатов и сигналы обновления по одному.
///
/// Вызовы X11 внутри синхронные; на многопоточном рантайме обработчики
/// выполняются через `block_in_place`, чтобы не занимать воркер.
pub struct ExpansionEngine<D: DictionarySource> {
    session: Box<dyn Session + Send>,
    source: Arc<D>,
    dictionary: Dictionary,
    injector: KeyInjector,
    candidates: HandoffReceiver<String>,
    refresh: mpsc::Receiver<RefreshSignal>,
    log_keys: bool,
}

impl<D: DictionarySource> ExpansionEngine<D> {
    pub fn new(
        mut session: Box<dyn Session + Send>,
        source: Arc<D>,
        candidates: HandoffReceiver<String>,
        refresh: mpsc::Receiver<RefreshSignal>,
        log_keys: bool,
    ) -> Result<Self> {
        let window = session.resolve_active_window()?;
        let dictionary = Dictionary::load(source.as_ref())?;
        info!(
            "Инициализация ExpansionEngine: {} фраз, активное окно {}",
            dictionary.len(),
            window
        );

        Ok(Self {
            session,
            source,
            dictionary,
            injector: KeyInjector::new(),
            candidates,
            refresh,
            log_keys,
        })
    }

    #[cfg(test)]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Обслуживать входы до закрытия обоих каналов.
    /// Кандидат проверяется раньше сигнала обновления: фраза, уже переданная движку,
    /// разрешается по снимку словаря на момент передачи.
    pub async fn run(&mut self) -> Result<()> {
        info!("ExpansionEngine запущен");
        let mut candidates_open = true;
        let mut refresh_open = true;

        loop {
            tokio::select! {
                biased;

                candidate = self.candidates.recv(), if candidates_open => match candidate {
                    Some(candidate) => {
                        blocking(|| self.handle_candidate(&candidate))?;
                    }
                    None => {
                        debug_if_enabled!("Канал кандидатов закрыт");
                        candidates_open = false;
                    }
                },
                signal = self.refresh.recv(), if refresh_open => match signal {
                    Some(RefreshSignal) => blocking(|| self.handle_refresh())?,
                    None => {
                        debug_if_enabled!("Канал обновлений закрыт");
                        refresh_open = false;
                    }
                },
                else => break,
            }
        }

        info!("ExpansionEngine остановлен");
        Ok(())
    }

    /// Заменить фразу расширением. Возвращает `true`, если фраза найдена.
    pub fn handle_candidate(&mut self, candidate: &str) -> Result<bool> {
        let phrase = candidate.trim();
        if self.log_keys {
            info!("Кандидат: {:?}", phrase);
        }

        let Some(expansion) = self.dictionary.lookup(phrase) else {
            return Ok(false);
        };
        let expansion = expansion.to_string();

        // Фраза плюс завершивший её терминатор
        let erase = phrase.chars().count() + 1;
        self.injector.backspace(self.session.as_mut(), erase)?;
        let typed = self.injector.send_keys(self.session.as_mut(), &expansion)?;

        info!(
            "Расширение применено в {}: стёрто {}, набрано {} символов",
            self.session.active_window(),
            erase,
            typed
        );
        Ok(true)
    }

    /// Перечитать активное окно, раскладку и словарь
    pub fn handle_refresh(&mut self) -> Result<()> {
        let window = self.session.resolve_active_window()?;
        if window.is_none() {
            warn!("Активного окна нет, расширения некуда набирать");
        }
        self.session.refresh_keymap()?;
        self.dictionary = Dictionary::load(self.source.as_ref())?;

        // Соединение движка событий не читает: ошибки SendEvent копятся в очереди
        let discarded = self.session.discard_pending_events()?;
        if discarded > 0 {
            debug_if_enabled!("Выброшено {} накопившихся событий X11", discarded);
        }

        info!(
            "Словарь перезагружен: {} фраз, активное окно {}",
            self.dictionary.len(),
            window
        );
        Ok(())
    }
}

/// Блокирующий вызов внутри задачи tokio
fn blocking<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{KeyState, Modifiers, WindowId};
    use crate::services::focus_tracker::refresh_channel;
    use crate::services::handoff::{handoff, HandoffSender};
    use crate::services::keymap::Keymap;
    use crate::services::session::{DryRunSession, SessionLog};
    use crate::store::Store;
    use parking_lot::Mutex;

    struct Harness {
        engine: ExpansionEngine<Store>,
        store: Arc<Store>,
        log: Arc<Mutex<SessionLog>>,
        candidates: HandoffSender<String>,
        refresh: mpsc::Sender<RefreshSignal>,
    }

    fn harness() -> Harness {
        let store = Arc::new(Store::in_memory().unwrap());
        let category = store.add_category("chat").unwrap();
        let brb = store.add_expansion(&category, "brb", "be right back").unwrap();
        store.add_phrase(&brb, "brb").unwrap();

        let session = DryRunSession::new().with_windows(vec![WindowId(0x77)]);
        let log = session.log();
        let (candidates, candidates_rx) = handoff();
        let (refresh, refresh_rx) = refresh_channel();

        let engine = ExpansionEngine::new(
            Box::new(session),
            Arc::clone(&store),
            candidates_rx,
            refresh_rx,
            false,
        )
        .unwrap();

        Harness { engine, store, log, candidates, refresh }
    }

    /// Разобрать журнал: число BackSpace и набранный текст
    fn decode(log: &SessionLog) -> (usize, String) {
        let keymap = Keymap::us_layout();
        let backspaces = log
            .sent
            .iter()
            .filter(|e| e.key_code.value() == 22)
            .count();
        let text = log
            .sent
            .iter()
            .filter(|e| e.key_code.value() != 22 && e.state == KeyState::Pressed)
            .filter_map(|e| keymap.symbol_for(e.key_code, e.modifiers))
            .collect();
        (backspaces, text)
    }

    #[tokio::test]
    async fn test_phrase_is_erased_and_expanded() {
        let Harness { mut engine, log, candidates, refresh, .. } = harness();
        drop(refresh);

        let sender = async move {
            candidates.send("brb".to_string()).await.unwrap();
        };
        let (_, result) = tokio::join!(sender, engine.run());
        result.unwrap();

        let log = log.lock();
        assert_eq!(log.sent.len(), 4 + 13 * 2);
        assert!(log.sent[..4].iter().all(|e| e.state == KeyState::Pressed));
        assert!(log.sent.iter().all(|e| e.window == WindowId(0x77)));
        assert_eq!(decode(&log), (4, "be right back".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_phrase_sends_nothing() {
        let Harness { mut engine, log, .. } = harness();

        assert!(!engine.handle_candidate("brbx").unwrap());
        assert!(!engine.handle_candidate("BRB").unwrap());
        assert!(log.lock().sent.is_empty());
    }

    #[tokio::test]
    async fn test_candidate_is_trimmed() {
        let Harness { mut engine, log, .. } = harness();

        assert!(engine.handle_candidate(" brb\t").unwrap());
        assert_eq!(decode(&log.lock()).0, 4);
    }

    #[tokio::test]
    async fn test_expansion_text_typed_back_does_not_match() {
        let Harness { mut engine, log, .. } = harness();

        for word in ["be", "right", "back"] {
            assert!(!engine.handle_candidate(word).unwrap());
        }
        assert!(log.lock().sent.is_empty());
    }

    #[tokio::test]
    async fn test_pending_candidate_resolves_before_reload() {
        let Harness { mut engine, store, log, candidates, refresh } = harness();

        // Сигнал обновления уже в очереди, словарь в хранилище уже другой
        refresh.try_send(RefreshSignal).unwrap();
        drop(refresh);
        let mut brb = store.read_expansions(&store.find_category_by_name("chat").unwrap().unwrap()).unwrap().remove(0);
        brb.text = "back soon".to_string();
        store.update_expansion_text(&brb).unwrap();

        let sender = async move {
            candidates.send("brb".to_string()).await.unwrap();
        };
        tokio::pin!(sender);
        // Кандидат ложится в канал раньше, чем движок начнёт работу
        tokio::select! {
            biased;
            _ = &mut sender => panic!("передача не может завершиться без движка"),
            _ = std::future::ready(()) => {}
        }

        let (_, result) = tokio::join!(sender, engine.run());
        result.unwrap();

        assert_eq!(decode(&log.lock()).1, "be right back");
        assert_eq!(engine.dictionary().lookup("brb"), Some("back soon"));
        assert_eq!(log.lock().keymap_reloads, 1);
    }

    #[tokio::test]
    async fn test_refresh_reloads_dictionary() {
        let Harness { mut engine, store, log, .. } = harness();
        let category = store.add_category("travel").unwrap();
        let omw = store.add_expansion(&category, "omw", "on my way").unwrap();
        store.add_phrase(&omw, "omw").unwrap();

        assert_eq!(engine.dictionary().lookup("omw"), None);
        engine.handle_refresh().unwrap();
        assert_eq!(engine.dictionary().lookup("omw"), Some("on my way"));
        // Накопившиеся ошибки X11 выбрасываются на каждом обновлении
        assert_eq!(log.lock().discards, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_on_multi_thread_runtime() {
        let Harness { mut engine, log, candidates, refresh, .. } = harness();

        let handle = tokio::spawn(async move { engine.run().await });
        candidates.send("brb".to_string()).await.unwrap();
        refresh.send(RefreshSignal).await.unwrap();
        drop(candidates);
        drop(refresh);
        handle.await.unwrap().unwrap();

        let log = log.lock();
        assert_eq!(decode(&log), (4, "be right back".to_string()));
        assert_eq!(log.keymap_reloads, 1);
        assert_eq!(log.discards, 1);
    }

    #[tokio::test]
    async fn test_shifted_expansion() {
        let Harness { mut engine, store, log, .. } = harness();
        let category = store.find_category_by_name("chat").unwrap().unwrap();
        let sig = store.add_expansion(&category, "sig", "Cheers, Ann!").unwrap();
        store.add_phrase(&sig, "sig").unwrap();
        engine.handle_refresh().unwrap();

        assert!(engine.handle_candidate("sig").unwrap());

        let log = log.lock();
        assert_eq!(decode(&log), (4, "Cheers, Ann!".to_string()));
        let shifted = log
            .sent
            .iter()
            .filter(|e| e.state == KeyState::Pressed && e.modifiers == Modifiers::new().with_shift(true))
            .count();
        assert_eq!(shifted, 3);
    }
}
