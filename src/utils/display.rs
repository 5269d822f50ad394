use tracing::{info, warn};

/// Проверить окружение X-сессии перед подключением.
/// Ничего не запрещает: подключение само сообщит о фатальной ошибке.
pub fn check_display(display: Option<&str>) {
    let env_display = std::env::var("DISPLAY").ok();
    let session_type = std::env::var("XDG_SESSION_TYPE").ok();

    for line in describe(display, env_display.as_deref(), session_type.as_deref()) {
        match line {
            Notice::Info(msg) => info!("{}", msg),
            Notice::Warn(msg) => warn!("{}", msg),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Notice {
    Info(String),
    Warn(String),
}

fn describe(display: Option<&str>, env_display: Option<&str>, session_type: Option<&str>) -> Vec<Notice> {
    let mut notices = Vec::new();

    match (display, env_display) {
        (Some(display), _) => notices.push(Notice::Info(format!("Дисплей из конфигурации: {}", display))),
        (None, Some(env)) if !env.is_empty() => notices.push(Notice::Info(format!("Дисплей из DISPLAY: {}", env))),
        _ => notices.push(Notice::Warn(
            "DISPLAY не задан, подключение к X-серверу, скорее всего, не удастся".to_string(),
        )),
    }

    if session_type == Some("wayland") {
        notices.push(Notice::Warn(
            "Сессия Wayland: события доступны только окнам XWayland".to_string(),
        ));
    }

    notices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_display_wins() {
        let notices = describe(Some(":1"), Some(":0"), Some("x11"));
        assert_eq!(notices, vec![Notice::Info("Дисплей из конфигурации: :1".to_string())]);
    }

    #[test]
    fn test_missing_display_and_wayland_warn() {
        let notices = describe(None, Some(""), Some("wayland"));
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|n| matches!(n, Notice::Warn(_))));
    }
}
