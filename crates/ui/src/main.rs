use std::sync::Arc;

use gpui::*;
use gpui_component::Root;
use grokchat_llm::{DEFAULT_ENDPOINT, ReplyClient, create_client};
use grokchat_storage::{KeyValueStore, MemoryStore, SqliteStore};
use tracing_subscriber::EnvFilter;

use grokchat::app::{ChatAppShell, Quit};
use grokchat::chat::{ChatHistory, ChatSession, ChatView};
use grokchat::settings::{AppSettings, SettingsStore};

fn open_history_store(settings: &AppSettings) -> Arc<dyn KeyValueStore> {
    match SqliteStore::open(&settings.database_path) {
        Ok(store) => Arc::new(store),
        Err(error) => {
            tracing::error!(
                "failed to open history database at {:?}: {}. history will not survive restart",
                settings.database_path,
                error
            );
            Arc::new(MemoryStore::new())
        }
    }
}

fn build_reply_client(settings: &AppSettings) -> Option<Arc<dyn ReplyClient>> {
    match create_client(&settings.endpoint) {
        Ok(client) => Some(client),
        Err(error) => {
            tracing::warn!(
                "invalid endpoint {:?}: {}. falling back to {}",
                settings.endpoint,
                error,
                DEFAULT_ENDPOINT
            );
            create_client(DEFAULT_ENDPOINT)
                .inspect_err(|error| tracing::error!("failed to build reply client: {error}"))
                .ok()
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings_store = SettingsStore::load();
    if let Err(error) = settings_store.persist_if_missing() {
        tracing::warn!("failed to write default settings: {error}");
    }
    let settings = settings_store.settings();

    let Some(client) = build_reply_client(&settings) else {
        return;
    };
    let session = ChatSession::restore(ChatHistory::new(open_history_store(&settings)));

    let app = Application::new().with_assets(gpui_component_assets::Assets);

    app.run(move |cx| {
        gpui_tokio_bridge::init(cx);
        gpui_component::init(cx);
        settings.apply_theme(None, cx);

        cx.on_action(|_: &Quit, cx| {
            cx.quit();
        });
        cx.bind_keys([KeyBinding::new("cmd-q", Quit, None)]);

        cx.spawn(async move |cx| {
            cx.update(|cx| {
                let options = WindowOptions {
                    window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                        None,
                        size(px(900.), px(760.)),
                        cx,
                    ))),
                    titlebar: Some(TitlebarOptions {
                        title: Some("Grok Chat".into()),
                        appears_transparent: true,
                        traffic_light_position: Some(point(px(9.), px(9.))),
                        ..Default::default()
                    }),
                    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
                    window_decorations: Some(WindowDecorations::Client),
                    #[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
                    window_decorations: None,
                    ..Default::default()
                };

                cx.open_window(options, |window, cx| {
                    let chat_view = cx.new(|cx| ChatView::new(session, client, window, cx));
                    let shell = cx.new(|_| ChatAppShell::new(chat_view, &settings.user_initials));

                    cx.new(|cx| Root::new(shell, window, cx))
                })
                .expect("failed to open main window");

                cx.activate(true);
            })
        })
        .detach();
    });
}
