use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
mod commands;
mod config;
mod error;
mod events;
mod mappings;
mod services;
mod store;
mod utils;

use config::{Config, LoggingConfig};
use services::session::SessionPair;
use services::{
    create_sessions, handoff, refresh_channel, ExpansionEngine, KeyCapture, SessionSupervisor,
};
use store::Store;

#[derive(Parser, Debug)]
#[command(name = "xpander")]
#[command(about = "Расширитель текста для X11: заменяет набранные фразы их расширениями")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "xpander.toml")]
    config: String,

    /// Режим сухого запуска (эмулируемая X-сессия, события только в лог)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает logging.filter)
    #[arg(long)]
    log_level: Option<String>,

    /// Логировать каждую клавишу и фразу
    #[arg(long)]
    log_keys: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Запустить демон захвата и замены (по умолчанию)
    Run,
    /// Пересоздать пустой словарь
    Reset,
    /// Показать категории, расширения и фразы
    List,
    /// Добавить расширение с фразами
    Add {
        #[arg(long)]
        category: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        text: String,
        #[arg(long = "phrase", required = true)]
        phrases: Vec<String>,
    },
    /// Переименовать категорию
    RenameCategory {
        #[arg(long)]
        name: String,
        #[arg(long)]
        to: String,
    },
    /// Переименовать расширение
    RenameExpansion {
        #[arg(long)]
        name: String,
        #[arg(long)]
        to: String,
    },
    /// Заменить текст расширения
    SetText {
        #[arg(long)]
        name: String,
        #[arg(long)]
        text: String,
    },
    /// Переименовать фразу-триггер
    RenamePhrase {
        #[arg(long)]
        name: String,
        #[arg(long)]
        to: String,
    },
    /// Удалить категорию вместе с её расширениями и фразами
    RemoveCategory {
        #[arg(long)]
        name: String,
    },
    /// Удалить расширение вместе с его фразами
    RemoveExpansion {
        #[arg(long)]
        name: String,
    },
    /// Удалить фразу
    RemovePhrase {
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    // Инициализация системы логирования
    init_tracing(args.log_level.as_deref(), &config.logging)?;

    info!("Запуск xpander v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    let store_path = config.store_path()?;
    let store = Store::open(&store_path)
        .with_context(|| format!("Не удалось открыть словарь {:?}", store_path))?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run_daemon(config, store, args.dry_run, args.log_keys).await,
        Command::Reset => {
            store.clean_slate()?;
            info!("Словарь {:?} очищен", store_path);
            Ok(())
        }
        Command::List => commands::list(&store, &mut std::io::stdout().lock()),
        Command::Add { category, name, text, phrases } => {
            commands::add(&store, &category, &name, &text, &phrases)
        }
        Command::RenameCategory { name, to } => commands::rename_category(&store, &name, &to),
        Command::RenameExpansion { name, to } => commands::rename_expansion(&store, &name, &to),
        Command::SetText { name, text } => commands::set_text(&store, &name, &text),
        Command::RenamePhrase { name, to } => commands::rename_phrase(&store, &name, &to),
        Command::RemoveCategory { name } => commands::remove_category(&store, &name),
        Command::RemoveExpansion { name } => commands::remove_expansion(&store, &name),
        Command::RemovePhrase { name } => commands::remove_phrase(&store, &name),
    }
}

async fn run_daemon(config: Config, store: Store, dry_run: bool, log_keys: bool) -> Result<()> {
    let log_keys = log_keys || config.capture.log_keys;
    if dry_run {
        warn!("Режим сухого запуска - X-сервер не используется");
    } else {
        utils::display::check_display(config.session.display.as_deref());
    }
    if log_keys {
        warn!("Логирование клавиш включено: набранный текст попадёт в лог");
    }

    let SessionPair { capture, engine } = create_sessions(&config, dry_run)?;
    let (candidates_tx, candidates_rx) = handoff();
    let (refresh_tx, refresh_rx) = refresh_channel();

    let mut engine = ExpansionEngine::new(engine, Arc::new(store), candidates_rx, refresh_rx, log_keys)?;
    let mut supervisor = SessionSupervisor::new(
        capture,
        KeyCapture::classifier_from_config(&config),
        config.capture.ignore_chords,
        log_keys,
        candidates_tx,
        refresh_tx,
    );

    info!("Все компоненты инициализированы");

    let engine_handle = tokio::spawn(async move { engine.run().await });

    // Цикл событий X11 блокирующий: отдельный поток, который не держит рантайм при выходе
    let (capture_done_tx, capture_done_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("xpander-capture".to_string())
        .spawn(move || {
            let _ = capture_done_tx.send(supervisor.run());
        })
        .context("Не удалось запустить поток захвата клавиш")?;

    info!("Все сервисы запущены");

    tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            }
        }
        result = capture_done_rx => {
            let err = match result {
                Ok(Err(e)) => anyhow::Error::from(e),
                Ok(Ok(())) => anyhow::anyhow!("Цикл захвата завершился без ошибки"),
                Err(_) => anyhow::anyhow!("Поток захвата аварийно завершён"),
            };
            error!("Фатальная ошибка в SessionSupervisor: {}", err);
            return Err(err);
        }
        result = engine_handle => {
            let err = match result {
                Ok(Err(e)) => anyhow::Error::from(e),
                Ok(Ok(())) => anyhow::anyhow!("ExpansionEngine остановлен: каналы закрыты"),
                Err(e) => anyhow::Error::from(e),
            };
            error!("Фатальная ошибка в ExpansionEngine: {}", err);
            return Err(err);
        }
    }

    info!("xpander завершил работу");
    Ok(())
}

fn init_tracing(cli_level: Option<&str>, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let directive = cli_level.unwrap_or(if logging.filter.trim().is_empty() {
        &logging.level
    } else {
        &logging.filter
    });

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directive))?;
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format.as_str() {
        "full" => registry.with(fmt::layer()).init(),
        _ => registry.with(fmt::layer().compact()).init(),
    }

    Ok(())
}
