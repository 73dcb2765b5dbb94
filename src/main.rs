// ============================================================================
// CoinWatch - Dashboard crypto dans le terminal
// ============================================================================
// Programme TUI : classement des cryptos CoinGecko, stats globales,
// recherche, tri, changement de devise et rafraîchissement automatique
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements, résultats et rendering
// 3. Async dans sync : un worker thread possède le runtime tokio
// 4. Channels mpsc : l'UI envoie des commandes, le worker renvoie des résultats
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use coinwatch::api::{DataClient, ReqwestTransport};
use coinwatch::app::App;
use coinwatch::cache::{Clock, SystemClock};
use coinwatch::config::Config;
use coinwatch::error::ApiError;
use coinwatch::models::MarketData;
use coinwatch::refresh::{self, RefreshRequest};
use coinwatch::ui::{events::EventHandler, render, Event};

// ============================================================================
// AppCommand / AppResult : protocole UI <-> worker
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des commandes au worker thread
// - Le worker exécute les tâches async (fetch API, test réseau)
// - App reste possédée par le thread UI : pas de Arc<Mutex<App>>
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Exécuter un cycle de chargement (global + classement en parallèle)
    Load(RefreshRequest),

    /// Tester la connectivité vers l'hôte de l'API
    ProbeNetwork,
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    Loaded {
        seq: u64,
        result: Result<MarketData, ApiError>,
    },

    Connectivity {
        online: bool,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - stdout appartient au TUI, on log vers un fichier
// - Rotation quotidienne automatique des logs
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans :
/// - Linux : ~/.local/share/coinwatch/logs/coinwatch.log
/// - macOS : ~/Library/Application Support/coinwatch/logs/coinwatch.log
/// - Sinon : ./logs/coinwatch.log
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/coinwatch/logs/coinwatch.log.*
/// RUST_LOG=coinwatch=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = dirs::data_local_dir()
        .map(|dir| dir.join("coinwatch").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"));

    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "coinwatch.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true)
                .with_thread_ids(true) // UI et worker sont sur deux threads
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinwatch=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("CoinWatch starting up");

    // Configuration invalide = on s'arrête avant de toucher au terminal
    let config = Config::load().context("Configuration invalide")?;

    // CONCEPT : pas de singleton
    // - Horloge, client et cache sont construits ici puis passés par ownership
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let transport = ReqwestTransport::new(config.request_timeout())
        .context("Échec de la création du client HTTP")?;
    let client = DataClient::new(
        transport,
        config.api_base_url.clone(),
        config.cache_window(),
        clock.clone(),
    );
    let runtime =
        tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;
    let probe_target = probe_target(&config.api_base_url);
    let probe_interval = config.probe_interval();

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    let worker = spawn_background_worker(runtime, client, probe_target, command_rx, result_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let mut app = App::new(config, clock);
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &command_tx, &result_rx, probe_interval);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    // Fermer le channel de commandes arrête le worker
    drop(command_tx);
    if worker.join().is_err() {
        error!("Worker thread panicked");
    }

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Thread + async runtime
// - Le worker possède le runtime tokio et le DataClient (donc le cache)
// - block_on() bloque le worker, jamais l'UI
// - Pas d'annulation : un résultat dépassé est ignoré par l'orchestrateur
// ============================================================================

fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    client: DataClient<ReqwestTransport>,
    probe_target: Option<String>,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        // recv() échoue quand l'UI a fermé le channel : on sort
        while let Ok(command) = command_rx.recv() {
            debug!(?command, "Worker received command");

            let result = match command {
                AppCommand::Load(request) => {
                    let result = runtime.block_on(refresh::execute(&client, &request));
                    if let Err(e) = &result {
                        error!(seq = request.seq, error = %e, "Market load failed");
                    }
                    AppResult::Loaded {
                        seq: request.seq,
                        result,
                    }
                }

                AppCommand::ProbeNetwork => {
                    let online = match &probe_target {
                        Some(target) => runtime.block_on(probe(target)),
                        None => true,
                    };
                    AppResult::Connectivity { online }
                }
            };

            if result_tx.send(result).is_err() {
                break;
            }
        }

        info!("Worker thread exiting (channel closed)");
    })
}

/// "host:port" de l'API, à partir de l'URL de base
fn probe_target(base_url: &str) -> Option<String> {
    let url = reqwest::Url::parse(base_url).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}

/// Connexion TCP courte vers l'hôte de l'API
///
/// CONCEPT : online/offline dans un terminal
/// - Pas d'événement navigateur : on teste périodiquement la connexion
async fn probe(target: &str) -> bool {
    let connect = tokio::net::TcpStream::connect(target);
    match tokio::time::timeout(Duration::from_secs(3), connect).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(%target, error = %e, "Connectivity probe failed");
            false
        }
        Err(_) => {
            debug!(%target, "Connectivity probe timed out");
            false
        }
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Résultats du worker
//   1. Timer de rafraîchissement + test réseau périodique
//   2. Render
//   3. Input
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: &mpsc::Sender<AppCommand>,
    result_rx: &mpsc::Receiver<AppResult>,
    probe_interval: Duration,
) -> Result<()> {
    send_load(command_tx, app.start());
    send_probe(command_tx);
    let mut last_probe = Instant::now();

    while app.is_running() {
        // ========================================
        // 0. RÉSULTATS : try_recv ne bloque pas
        // ========================================
        loop {
            match result_rx.try_recv() {
                Ok(AppResult::Loaded { seq, result }) => {
                    if !app.apply_result(seq, result) {
                        debug!(seq, "Result superseded, ignored");
                    }
                }
                Ok(AppResult::Connectivity { online }) => {
                    send_load(command_tx, app.set_online(online));
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    break;
                }
            }
        }

        // ========================================
        // 1. TIMERS
        // ========================================
        send_load(command_tx, app.poll_timer());

        if last_probe.elapsed() >= probe_interval {
            send_probe(command_tx);
            last_probe = Instant::now();
        }

        // ========================================
        // 2. RENDER
        // ========================================
        terminal.draw(|frame| render(frame, app))?;

        // ========================================
        // 3. INPUT
        // ========================================
        match events.next() {
            Ok(event) => handle_event(app, event, command_tx),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

/// Demande un test de connectivité au worker
fn send_probe(command_tx: &mpsc::Sender<AppCommand>) {
    if command_tx.send(AppCommand::ProbeNetwork).is_err() {
        error!("Worker channel closed, connectivity probe dropped");
    }
}

/// Envoie la requête au worker si l'orchestrateur en a émis une
fn send_load(command_tx: &mpsc::Sender<AppCommand>, request: Option<RefreshRequest>) {
    if let Some(request) = request {
        if command_tx.send(AppCommand::Load(request)).is_err() {
            error!("Worker channel closed, load request dropped");
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching avec guards
/// - Le mode recherche capture toutes les touches
/// - Sur le dashboard, chaque touche a sa propre action
fn handle_event(app: &mut App, event: Event, command_tx: &mpsc::Sender<AppCommand>) {
    use coinwatch::ui::events::{
        get_char_from_event, is_auto_refresh_event, is_backspace_event, is_currency_event,
        is_down_event, is_enter_event, is_escape_event, is_quit_event, is_refresh_event,
        is_retry_event, is_search_event, is_up_event, sort_field_from_event,
    };

    match event {
        Event::FocusGained => send_load(command_tx, app.set_visible(true)),
        Event::FocusLost => send_load(command_tx, app.set_visible(false)),
        Event::Tick => {}

        // ========================================
        // Mode recherche : filtre en direct
        // ========================================
        Event::Key(_) if app.is_searching() => {
            if is_escape_event(&event) {
                debug!("User cleared search");
                app.cancel_search();
            } else if is_enter_event(&event) {
                info!(filter = %app.view().filter_text(), "User kept search filter");
                app.submit_search();
            } else if is_backspace_event(&event) {
                app.search_backspace();
            } else if let Some(c) = get_char_from_event(&event) {
                app.search_push(c);
            }
        }

        // ========================================
        // Dashboard
        // ========================================
        Event::Key(_) if is_quit_event(&event) => {
            // Two-step quit : première pression = confirmation
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        Event::Key(_) => {
            // Toute autre touche annule la confirmation de quit
            app.cancel_quit();

            if is_up_event(&event) {
                app.navigate_up();
            } else if is_down_event(&event) {
                app.navigate_down();
            } else if is_search_event(&event) {
                debug!("User entered search mode");
                app.start_search();
            } else if is_refresh_event(&event) {
                info!("User requested manual refresh");
                send_load(command_tx, app.manual_refresh());
            } else if is_retry_event(&event) {
                info!("User requested retry");
                send_load(command_tx, app.retry());
            } else if is_currency_event(&event) {
                send_load(command_tx, app.cycle_currency());
            } else if is_auto_refresh_event(&event) {
                app.toggle_auto_refresh();
            } else if let Some(field) = sort_field_from_event(&event) {
                debug!(?field, "User changed sort");
                app.sort_by(field);
            }
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI
///
/// CONCEPT : EnableFocusChange
/// - Le terminal envoie FocusGained / FocusLost (visibilité de la vue)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableFocusChange)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_probe_reaches_worker_and_survives_closed_channel() {
        let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
        send_probe(&command_tx);
        assert!(matches!(command_rx.try_recv(), Ok(AppCommand::ProbeNetwork)));

        drop(command_rx);
        send_probe(&command_tx);
    }

    #[test]
    fn test_probe_target_uses_known_port() {
        assert_eq!(
            probe_target("https://api.coingecko.com/api/v3").as_deref(),
            Some("api.coingecko.com:443")
        );
        assert_eq!(
            probe_target("http://localhost:8080/v3").as_deref(),
            Some("localhost:8080")
        );
        assert_eq!(probe_target("not a url"), None);
    }
}
