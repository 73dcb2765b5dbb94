// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier, le focus du terminal et les ticks
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching : convertir les événements crossterm en événements app
// 3. Error handling avec Result
//
// CONCEPT : Focus = visibilité
// - Le terminal signale FocusGained / FocusLost (EnableFocusChange)
// - C'est l'équivalent d'un onglet de navigateur visible / caché
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};

use crate::view::SortField;

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Le terminal a reçu le focus (vue visible)
    FocusGained,

    /// Le terminal a perdu le focus (vue cachée)
    FocusLost,

    /// Tick régulier (timer, résultats du worker, redraw)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    poll_timeout: Duration,
}

impl EventHandler {
    /// Crée un gestionnaire avec un timeout de poll de 250ms
    pub fn new() -> Self {
        Self {
            poll_timeout: Duration::from_millis(250),
        }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend max 250ms
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.poll_timeout)? {
            return Ok(Event::Tick);
        }

        let event = match event::read()? {
            // Sur certains OS, on reçoit Press ET Release : on ne garde que Press
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
            CrosstermEvent::FocusGained => Event::FocusGained,
            CrosstermEvent::FocusLost => Event::FocusLost,
            _ => Event::Tick,
        };

        Ok(event)
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : Convertir KeyEvent en action
// ============================================================================

/// Extrait le KeyCode d'un événement clavier
fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        _ => None,
    }
}

/// 'q' : quitter (confirmation en deux temps)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up | KeyCode::Char('k')))
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down | KeyCode::Char('j')))
}

/// 'r' : rafraîchir maintenant (vide le cache)
pub fn is_refresh_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('r')))
}

/// 'R' : relancer après une erreur (respecte le cache)
pub fn is_retry_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('R')))
}

/// '/' : mode recherche (Vim-like)
pub fn is_search_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('/')))
}

/// 'c' : devise suivante
pub fn is_currency_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('c') | KeyCode::Char('C')))
}

/// 'a' : active/désactive le rafraîchissement automatique
pub fn is_auto_refresh_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('a') | KeyCode::Char('A')))
}

/// '1' à '6' : colonne de tri (dans l'ordre des colonnes du tableau)
pub fn sort_field_from_event(event: &Event) -> Option<SortField> {
    match key_code(event)? {
        KeyCode::Char(c) => {
            let index = c.to_digit(10)? as usize;
            SortField::ALL.get(index.checked_sub(1)?).copied()
        }
        _ => None,
    }
}

/// Caractère saisissable dans la recherche (pas de Ctrl/Alt)
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match event {
        Event::Key(key)
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            match key.code {
                KeyCode::Char(c) if !c.is_control() => Some(c),
                _ => None,
            }
        }
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_refresh_and_retry_are_distinct() {
        assert!(is_refresh_event(&key(KeyCode::Char('r'))));
        assert!(!is_retry_event(&key(KeyCode::Char('r'))));
        assert!(is_retry_event(&key(KeyCode::Char('R'))));
    }

    #[test]
    fn test_sort_field_from_digits() {
        assert_eq!(sort_field_from_event(&key(KeyCode::Char('1'))), Some(SortField::Rank));
        assert_eq!(sort_field_from_event(&key(KeyCode::Char('3'))), Some(SortField::Price));
        assert_eq!(sort_field_from_event(&key(KeyCode::Char('6'))), Some(SortField::Volume));
        assert_eq!(sort_field_from_event(&key(KeyCode::Char('0'))), None);
        assert_eq!(sort_field_from_event(&key(KeyCode::Char('7'))), None);
        assert_eq!(sort_field_from_event(&key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_get_char_ignores_control_chords() {
        assert_eq!(get_char_from_event(&key(KeyCode::Char('e'))), Some('e'));
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(get_char_from_event(&ctrl_c), None);
        assert_eq!(get_char_from_event(&Event::FocusLost), None);
    }
}
