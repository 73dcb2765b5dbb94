// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine le header (stats globales), le tableau des cryptos et le footer
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Table + TableState : tableau avec ligne sélectionnée
// 3. Layout : découpage de l'espace en zones
// 4. Style : couleurs et attributs de texte
//
// Le rendu lit uniquement la DashboardSurface (dernière image publiée)
// ============================================================================

use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::format::Trend;
use crate::refresh::RefreshStatus;
use crate::ui::surface::MarketFrame;
use crate::view::{CoinRow, SortField, SortSpec};

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size(), has_banner(&app.surface().status));

    render_header(frame, app, chunks[0]);

    let (table_area, footer_area) = match chunks.len() {
        4 => {
            render_banner(frame, &app.surface().status, chunks[1]);
            (chunks[2], chunks[3])
        }
        _ => (chunks[1], chunks[2]),
    };

    render_table(frame, app, table_area);

    if app.is_searching() {
        render_search_footer(frame, app, footer_area);
    } else {
        render_footer(frame, app, footer_area);
    }
}

// ============================================================================
// Layout : Découpage de l'écran
// ============================================================================

/// Header, bannière optionnelle (erreur / hors ligne), tableau, footer
fn create_layout(area: Rect, with_banner: bool) -> Vec<Rect> {
    let mut constraints = vec![Constraint::Length(4)];
    if with_banner {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(3));

    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
        .to_vec() // Convertit Rc<[Rect]> en Vec<Rect>
}

fn has_banner(status: &RefreshStatus) -> bool {
    status.error.is_some() || status.offline
}

// ============================================================================
// Header : stats globales + état du rafraîchissement
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let surface = app.surface();
    let status = &surface.status;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" CoinWatch ")
        .title_alignment(Alignment::Center);

    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

    let stats = match surface.frame.as_ref().and_then(|f| f.snapshot.as_ref()) {
        Some(snapshot) => Line::from(vec![
            Span::styled("Market Cap ", label),
            Span::styled(snapshot.total_market_cap.clone(), value),
            Span::styled("   Volume 24h ", label),
            Span::styled(snapshot.total_volume.clone(), value),
            Span::styled("   BTC Dominance ", label),
            Span::styled(snapshot.btc_dominance.clone(), value),
        ]),
        None => Line::from(Span::styled("Statistiques globales indisponibles", label)),
    };

    let currency = app.view().currency().to_uppercase();
    let auto = if status.auto_refresh { "ON" } else { "OFF" };
    let mut state_spans = vec![
        Span::styled("Devise ", label),
        Span::styled(currency, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::styled("   Auto ", label),
        Span::styled(
            auto,
            Style::default().fg(if status.auto_refresh { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled("   Mis à jour ", label),
        Span::styled(last_updated_label(status.last_updated_ms), value),
    ];
    if status.loading {
        state_spans.push(Span::styled(
            "   ⟳ Chargement...",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph = Paragraph::new(vec![stats, Line::from(state_spans)])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Heure locale du dernier succès ("14:03:27"), "-" si jamais chargé
fn last_updated_label(last_updated_ms: Option<i64>) -> String {
    last_updated_ms
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

// ============================================================================
// Bannière : erreur de chargement ou hors ligne
// ============================================================================

fn render_banner(frame: &mut Frame, status: &RefreshStatus, area: Rect) {
    let Some((text, color)) = banner_text(status) else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let paragraph = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .block(block)
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Texte et couleur de la bannière ; hors ligne + échec affiche les deux
fn banner_text(status: &RefreshStatus) -> Option<(String, Color)> {
    const OFFLINE: &str = "Hors ligne : les données affichées peuvent être périmées";

    match (&status.error, status.offline) {
        (Some(error), true) => Some((
            format!("{OFFLINE} | Échec du chargement ({error}) - [R] pour réessayer"),
            Color::Red,
        )),
        (None, true) => Some((OFFLINE.to_string(), Color::Yellow)),
        (Some(error), false) => Some((
            format!("Échec du chargement ({error}) - [R] pour réessayer"),
            Color::Red,
        )),
        (None, false) => None,
    }
}

// ============================================================================
// Tableau des cryptos
// ============================================================================
// CONCEPT RATATUI : Table + TableState
// - Row / Cell : une ligne et ses cellules stylées
// - TableState garde l'index sélectionné et gère le scrolling
// ============================================================================

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let Some(market) = app.surface().frame.as_ref() else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(table_title(market));

    if market.rows.is_empty() {
        let message = if market.total == 0 {
            "Aucune donnée pour le moment"
        } else {
            "Aucune crypto ne correspond à la recherche"
        };
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
        ])
        .block(block)
        .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(
        SortField::ALL
            .iter()
            .map(|field| Cell::from(column_title(*field, market.sort)))
            .chain(std::iter::once(Cell::from("7d"))),
    )
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let rows: Vec<Row> = market.rows.iter().map(coin_row).collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Min(22),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(17),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

    let mut state = TableState::default().with_selected(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}

/// " Cryptos (12 / 100) " ou avec le filtre actif
fn table_title(market: &MarketFrame) -> String {
    if market.filter.is_empty() {
        format!(" Cryptos ({}) ", market.total)
    } else {
        format!(
            " Cryptos ({} / {}) - filtre \"{}\" ",
            market.rows.len(),
            market.total,
            market.filter
        )
    }
}

/// Titre de colonne avec sa touche et la flèche si elle est triée
fn column_title(field: SortField, sort: SortSpec) -> String {
    let key = SortField::ALL
        .iter()
        .position(|f| *f == field)
        .map(|i| i + 1)
        .unwrap_or(0);

    if field == sort.field {
        format!("{} {} {}", key, field.label(), sort.direction.arrow())
    } else {
        format!("{} {}", key, field.label())
    }
}

fn coin_row(row: &CoinRow) -> Row<'static> {
    let change_color = if row.is_positive { Color::Green } else { Color::Red };
    let spark_color = match row.trend {
        Some(Trend::Up) => Color::Green,
        Some(Trend::Down) => Color::Red,
        None => Color::DarkGray,
    };

    Row::new(vec![
        Cell::from(row.rank.clone()).style(Style::default().fg(Color::Gray)),
        Cell::from(Line::from(vec![
            Span::styled(row.name.clone(), Style::default().fg(Color::White)),
            Span::styled(format!(" {}", row.symbol), Style::default().fg(Color::DarkGray)),
        ])),
        Cell::from(row.price.clone()),
        Cell::from(row.change.clone()).style(Style::default().fg(change_color)),
        Cell::from(row.market_cap.clone()),
        Cell::from(row.volume.clone()),
        Cell::from(row.sparkline.clone().unwrap_or_default())
            .style(Style::default().fg(spark_color)),
    ])
}

// ============================================================================
// Footer : raccourcis, confirmation de quit, ou saisie de recherche
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", key),
            Span::raw(" Quit  "),
            Span::styled("[↑↓ / j k]", key),
            Span::raw(" Navigate  "),
            Span::styled("[/]", key),
            Span::raw(" Search  "),
            Span::styled("[1-6]", key),
            Span::raw(" Sort  "),
            Span::styled("[c]", key),
            Span::raw(" Currency  "),
            Span::styled("[r]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Refresh  "),
            Span::styled("[a]", key),
            Span::raw(" Auto-refresh"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Ligne de saisie de la recherche (le tableau se filtre en direct)
fn render_search_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" [Enter] garder  [ESC] effacer ");

    let input_line = Line::from(vec![
        Span::styled("Search: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(app.view().filter_text().to_string(), Style::default().fg(Color::White)),
        Span::styled("█", Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK)),
    ]);

    let paragraph = Paragraph::new(vec![input_line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}
