// ============================================================================
// Structure : ViewState
// ============================================================================
// État de présentation : jeu de données courant + filtre + tri + devise
//
// CONCEPTS RUST :
// 1. Projection dérivée : filtered_sorted() est recalculée à chaque appel,
//    jamais stockée -> impossible de la désynchroniser de all_coins
// 2. Enums pour le tri : SortField ne peut désigner qu'un champ valide
// 3. Tri stable (sort_by) : les égalités gardent l'ordre de l'API
// ============================================================================

use std::cmp::Ordering;

use crate::format::{
    format_change, format_currency, format_magnitude, format_sparkline, sparkline_trend, Trend,
    MISSING,
};
use crate::models::{CoinRecord, MarketData, MarketSnapshot};

// ============================================================================
// Tri
// ============================================================================

/// Colonne de tri (chaque variante correspond à un champ de CoinRecord)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Rank,
    Name,
    Price,
    Change24h,
    MarketCap,
    Volume,
}

impl SortField {
    /// Ordre des colonnes du tableau (touches 1 à 6)
    pub const ALL: [SortField; 6] = [
        SortField::Rank,
        SortField::Name,
        SortField::Price,
        SortField::Change24h,
        SortField::MarketCap,
        SortField::Volume,
    ];

    /// Titre de colonne
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Rank => "#",
            SortField::Name => "Name",
            SortField::Price => "Price",
            SortField::Change24h => "24h %",
            SortField::MarketCap => "Market Cap",
            SortField::Volume => "Volume (24h)",
        }
    }

    /// Valeur numérique du champ (null -> 0)
    fn numeric(&self, coin: &CoinRecord) -> f64 {
        match self {
            SortField::Rank => coin.rank.map(f64::from),
            SortField::Price => Some(coin.current_price),
            SortField::Change24h => coin.price_change_pct_24h,
            SortField::MarketCap => coin.market_cap,
            SortField::Volume => coin.total_volume,
            SortField::Name => None,
        }
        .unwrap_or(0.0)
    }

    /// Compare deux pièces en ordre croissant sur ce champ
    fn compare(&self, a: &CoinRecord, b: &CoinRecord) -> Ordering {
        match self {
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            _ => self.numeric(a).total_cmp(&self.numeric(b)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Indicateur affiché dans l'en-tête de colonne
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

/// Tri actif : champ + direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Capitalisation décroissante, comme le classement de l'API
    fn default() -> Self {
        Self {
            field: SortField::MarketCap,
            direction: SortDirection::Desc,
        }
    }
}

// ============================================================================
// Ligne prête à afficher
// ============================================================================

/// Une pièce de la projection, augmentée de ses textes formatés
#[derive(Debug, Clone, PartialEq)]
pub struct CoinRow {
    pub id: String,
    pub rank: String,
    pub name: String,
    pub symbol: String,
    pub price: String,
    pub change: String,
    pub is_positive: bool,
    pub market_cap: String,
    pub volume: String,
    /// None si la série contient moins de deux points
    pub sparkline: Option<String>,
    pub trend: Option<Trend>,
}

impl CoinRow {
    pub fn from_record(coin: &CoinRecord, currency: &str, sparkline_width: usize) -> Self {
        Self {
            id: coin.id.clone(),
            rank: coin
                .rank
                .map(|rank| rank.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
            name: coin.name.clone(),
            symbol: coin.display_symbol(),
            price: format_currency(Some(coin.current_price), currency),
            change: format_change(coin.price_change_pct_24h),
            is_positive: coin.is_positive(),
            market_cap: format_magnitude(coin.market_cap, 2),
            volume: format_magnitude(coin.total_volume, 2),
            sparkline: format_sparkline(&coin.sparkline, sparkline_width),
            trend: sparkline_trend(&coin.sparkline),
        }
    }
}

// ============================================================================
// ViewState
// ============================================================================

/// État de présentation du dashboard
///
/// CONCEPT : Encapsulation
/// - Les champs sont privés : toute modification passe par set_*()
/// - La projection n'est jamais stockée, seulement dérivée
#[derive(Debug, Clone)]
pub struct ViewState {
    all_coins: Vec<CoinRecord>,
    snapshot: Option<MarketSnapshot>,
    filter_text: String,
    sort: SortSpec,
    /// Devise demandée (prochaine requête + header)
    currency: String,
    /// Devise des prix actuellement chargés
    data_currency: Option<String>,
}

impl ViewState {
    /// Crée un état vide pour la devise donnée
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            all_coins: Vec::new(),
            snapshot: None,
            filter_text: String::new(),
            sort: SortSpec::default(),
            currency: currency.into(),
            data_currency: None,
        }
    }

    /// Remplace la liste entière (jamais de fusion)
    pub fn set_coins(&mut self, coins: Vec<CoinRecord>) {
        self.all_coins = coins;
    }

    /// Applique un cycle réussi : pièces et snapshot remplacés ensemble
    pub fn apply_market(&mut self, data: MarketData) {
        self.snapshot = Some(data.snapshot);
        self.data_currency = Some(data.currency);
        self.set_coins(data.coins);
    }

    /// Filtre insensible à la casse sur le nom OU le symbole
    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter_text = text.into();
    }

    /// Active une colonne de tri
    ///
    /// - Même colonne : inverse la direction
    /// - Autre colonne : la sélectionne en décroissant ("premier clic = du plus
    ///   grand au plus petit")
    pub fn set_sort(&mut self, field: SortField) {
        if self.sort.field == field {
            self.sort.direction = self.sort.direction.toggled();
        } else {
            self.sort = SortSpec {
                field,
                direction: SortDirection::Desc,
            };
        }
    }

    pub fn set_currency(&mut self, currency: impl Into<String>) {
        self.currency = currency.into();
    }

    /// Projection : filtre puis tri, recalculée à chaque appel
    ///
    /// CONCEPT RUST : slice::sort_by est stable
    /// - Les valeurs égales gardent leur ordre relatif d'origine, dans les
    ///   deux directions (en décroissant on compare b à a, pas l'inverse du
    ///   résultat croissant)
    pub fn filtered_sorted(&self) -> Vec<&CoinRecord> {
        let needle = self.filter_text.to_lowercase();
        let mut projection: Vec<&CoinRecord> = self
            .all_coins
            .iter()
            .filter(|coin| needle.is_empty() || coin.matches(&needle))
            .collect();

        let SortSpec { field, direction } = self.sort;
        projection.sort_by(|a, b| match direction {
            SortDirection::Asc => field.compare(a, b),
            SortDirection::Desc => field.compare(b, a),
        });

        projection
    }

    /// Projection formatée pour la surface de rendu
    ///
    /// Les prix sont libellés dans la devise où ils ont été chargés : après
    /// un changement de devise, les anciennes lignes gardent leur symbole
    /// jusqu'à l'arrivée des nouvelles données (ou pour toujours si le
    /// chargement échoue)
    pub fn rows(&self, sparkline_width: usize) -> Vec<CoinRow> {
        let currency = self.data_currency();
        self.filtered_sorted()
            .into_iter()
            .map(|coin| CoinRow::from_record(coin, currency, sparkline_width))
            .collect()
    }

    pub fn all_coins(&self) -> &[CoinRecord] {
        &self.all_coins
    }

    pub fn snapshot(&self) -> Option<&MarketSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Devise des données affichées (la devise demandée tant que rien n'est chargé)
    pub fn data_currency(&self) -> &str {
        self.data_currency.as_deref().unwrap_or(&self.currency)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(name: &str, symbol: &str, price: f64) -> CoinRecord {
        let mut coin = CoinRecord::new(name.to_lowercase(), name, symbol);
        coin.current_price = price;
        coin
    }

    fn names(view: &ViewState) -> Vec<&str> {
        view.filtered_sorted().iter().map(|c| c.name.as_str()).collect()
    }

    fn sample() -> ViewState {
        let mut view = ViewState::new("usd");
        view.set_coins(vec![
            coin("Bitcoin", "btc", 60_000.0),
            coin("Ethereum", "eth", 3_000.0),
            coin("Solana", "sol", 150.0),
        ]);
        view
    }

    #[test]
    fn test_filter_is_case_insensitive_on_name_or_symbol() {
        let mut view = ViewState::new("usd");
        view.set_coins(vec![coin("Bitcoin", "btc", 1.0), coin("Ethereum", "eth", 2.0)]);

        view.set_filter("ETH");
        assert_eq!(names(&view), vec!["Ethereum"]);

        view.set_filter("coin");
        assert_eq!(names(&view), vec!["Bitcoin"]);

        view.set_filter("");
        assert_eq!(view.filtered_sorted().len(), 2);
    }

    #[test]
    fn test_sort_toggling() {
        let mut view = sample();

        view.set_sort(SortField::Price);
        assert_eq!(view.sort().direction, SortDirection::Desc);
        assert_eq!(names(&view), vec!["Bitcoin", "Ethereum", "Solana"]);

        view.set_sort(SortField::Price);
        assert_eq!(view.sort().direction, SortDirection::Asc);
        assert_eq!(names(&view), vec!["Solana", "Ethereum", "Bitcoin"]);

        view.set_sort(SortField::Name);
        assert_eq!(view.sort().field, SortField::Name);
        assert_eq!(view.sort().direction, SortDirection::Desc);
        assert_eq!(names(&view), vec!["Solana", "Ethereum", "Bitcoin"]);
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let mut view = ViewState::new("usd");
        view.set_coins(vec![
            coin("bnb", "bnb", 1.0),
            coin("Aave", "aave", 1.0),
            coin("Cardano", "ada", 1.0),
        ]);

        view.set_sort(SortField::Name);
        view.set_sort(SortField::Name);
        assert_eq!(names(&view), vec!["Aave", "bnb", "Cardano"]);
    }

    #[test]
    fn test_missing_numbers_sort_as_zero() {
        let mut a = coin("A", "a", 1.0);
        a.market_cap = Some(-5.0);
        let b = coin("B", "b", 1.0); // market_cap = None -> 0
        let mut c = coin("C", "c", 1.0);
        c.market_cap = Some(10.0);

        let mut view = ViewState::new("usd");
        view.set_coins(vec![a, b, c]);

        // Tri par défaut : capitalisation décroissante
        assert_eq!(names(&view), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_ties_keep_upstream_order_in_both_directions() {
        let mut view = ViewState::new("usd");
        view.set_coins(vec![
            coin("First", "f", 5.0),
            coin("Second", "s", 5.0),
            coin("Third", "t", 5.0),
        ]);

        view.set_sort(SortField::Price);
        assert_eq!(names(&view), vec!["First", "Second", "Third"]);
        view.set_sort(SortField::Price);
        assert_eq!(names(&view), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_projection_follows_new_coins() {
        let mut view = sample();
        view.set_filter("sol");
        assert_eq!(names(&view), vec!["Solana"]);

        // Nouveau jeu sans Solana : la projection ne peut pas la contenir
        view.set_coins(vec![coin("Bitcoin", "btc", 1.0)]);
        assert!(view.filtered_sorted().is_empty());

        view.set_filter("");
        assert_eq!(names(&view), vec!["Bitcoin"]);
    }

    #[test]
    fn test_rows_are_formatted_in_current_currency() {
        let mut view = ViewState::new("eur");
        let mut btc = coin("Bitcoin", "btc", 43_250.5);
        btc.rank = Some(1);
        btc.market_cap = Some(850_000_000_000.0);
        btc.price_change_pct_24h = Some(-1.234);
        btc.sparkline = vec![1.0, 3.0];
        view.set_coins(vec![btc]);

        let rows = view.rows(8);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rank, "1");
        assert_eq!(rows[0].symbol, "BTC");
        assert_eq!(rows[0].price, "€43,250.50");
        assert_eq!(rows[0].change, "▼ 1.23%");
        assert!(!rows[0].is_positive);
        assert_eq!(rows[0].market_cap, "$850.00B");
        assert_eq!(rows[0].volume, "-");
        assert_eq!(rows[0].sparkline.as_deref(), Some("▁█"));
        assert_eq!(rows[0].trend, Some(Trend::Up));
    }

    #[test]
    fn test_rows_use_the_currency_the_prices_were_loaded_in() {
        let mut view = ViewState::new("usd");
        view.apply_market(MarketData {
            snapshot: MarketSnapshot {
                total_market_cap_usd: 1e12,
                total_volume_usd: 1e10,
                btc_dominance_pct: 50.0,
            },
            coins: vec![coin("Bitcoin", "btc", 60_000.0)],
            currency: "usd".to_string(),
        });

        view.set_currency("eur");
        assert_eq!(view.currency(), "eur");
        assert_eq!(view.data_currency(), "usd");
        assert_eq!(view.rows(8)[0].price, "$60,000.00");
    }
}
