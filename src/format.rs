// ============================================================================
// Module : format
// ============================================================================
// Fonctions pures qui convertissent des valeurs numériques en texte affichable
//
// CONCEPTS RUST :
// 1. Option<f64> : une valeur absente s'affiche "-" (jamais de panic)
// 2. format! avec précision dynamique : {:.*} prend la précision en argument
// 3. Fonctions pures : même entrée -> même sortie, aucun effet de bord
// ============================================================================

/// Texte affiché quand une valeur est absente
pub const MISSING: &str = "-";

/// Seuils d'abréviation, du plus grand au plus petit (le premier qui matche gagne)
const MAGNITUDES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Glyphes utilisés pour la sparkline 7 jours (8 niveaux)
const SPARK_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

// ============================================================================
// Montants abrégés et pourcentages
// ============================================================================

/// Abrège un montant : 1_500_000_000 -> "$1.50B"
///
/// CONCEPT RUST : let-else
/// - `let Some(v) = value else { ... }` : early return si None
/// - Plus lisible qu'un match pour un seul cas
///
/// Le préfixe est toujours "$", quelle que soit la devise sélectionnée.
pub fn format_magnitude(value: Option<f64>, decimals: usize) -> String {
    let Some(value) = value else {
        return MISSING.to_string();
    };

    for (threshold, suffix) in MAGNITUDES {
        if value >= threshold {
            return format!("${:.*}{}", decimals, value / threshold, suffix);
        }
    }

    format!("${:.*}", decimals, value)
}

/// Pourcentage à deux décimales : -3.456 -> "-3.46%"
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.2}%", value),
        None => MISSING.to_string(),
    }
}

/// Variation 24h avec flèche : "▲ 2.11%" ou "▼ 3.46%"
///
/// Une variation absente est traitée comme 0 (donc en hausse).
pub fn format_change(value: Option<f64>) -> String {
    let change = value.unwrap_or(0.0);
    let arrow = if change >= 0.0 { "▲" } else { "▼" };
    format!("{} {:.2}%", arrow, change.abs())
}

// ============================================================================
// Montants en devise
// ============================================================================

/// Formate un prix dans la devise donnée (style en-US)
///
/// - amount < 1 : entre 4 et 6 décimales (plus de précision pour les petits prix)
/// - amount >= 1 : exactement 2 décimales
/// - Séparateur de milliers "," : 43250.5 -> "$43,250.50"
///
/// Un code inconnu ne fait jamais échouer le formatage : "XYZ 1.00".
pub fn format_currency(amount: Option<f64>, currency_code: &str) -> String {
    let Some(amount) = amount else {
        return MISSING.to_string();
    };

    let (min_digits, max_digits) = if amount < 1.0 { (4, 6) } else { (2, 2) };
    let digits = format_fraction(amount.abs(), min_digits, max_digits);
    let grouped = group_thousands(&digits);

    // Pas de "-$0.0000" pour un montant arrondi à zéro
    let is_zero = digits.chars().all(|c| c == '0' || c == '.');
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };

    let code = currency_code.to_uppercase();
    match currency_symbol(&code) {
        Some(symbol) => format!("{}{}{}", sign, symbol, grouped),
        None => format!("{}{} {}", sign, code, grouped),
    }
}

/// Symbole d'une devise connue (codes en majuscules)
fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        "AUD" => Some("A$"),
        "CAD" => Some("CA$"),
        _ => None,
    }
}

/// Arrondit à `max` décimales puis retire les zéros finaux jusqu'à `min`
fn format_fraction(value: f64, min: usize, max: usize) -> String {
    let mut text = format!("{:.*}", max, value);

    if let Some(dot) = text.find('.') {
        while text.len() - dot - 1 > min && text.ends_with('0') {
            text.pop();
        }
    }

    text
}

/// Insère "," tous les trois chiffres dans la partie entière
fn group_thousands(digits: &str) -> String {
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(digits.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    grouped
}

// ============================================================================
// Sparkline 7 jours
// ============================================================================

/// Tendance d'une série : hausse si le dernier point >= le premier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

/// Tendance de la sparkline (None si moins de deux points)
pub fn sparkline_trend(prices: &[f64]) -> Option<Trend> {
    let (first, last) = (prices.first()?, prices.last()?);
    if prices.len() < 2 {
        return None;
    }

    Some(if last >= first { Trend::Up } else { Trend::Down })
}

/// Dessine la série en `width` glyphes Unicode
///
/// CONCEPT : Rééchantillonnage
/// - 168 points horaires ne tiennent pas dans une cellule de tableau
/// - On prend un point tous les (n - 1) / (width - 1)
/// - Chaque point est normalisé entre min et max (range = 1 si la série est plate)
pub fn format_sparkline(prices: &[f64], width: usize) -> Option<String> {
    if prices.len() < 2 || width == 0 {
        return None;
    }

    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max - min > 0.0 { max - min } else { 1.0 };

    let columns = width.min(prices.len());
    let top = (SPARK_GLYPHS.len() - 1) as f64;

    let line = (0..columns)
        .map(|column| {
            let index = if columns == 1 {
                0
            } else {
                column * (prices.len() - 1) / (columns - 1)
            };
            let level = ((prices[index] - min) / range * top).round() as usize;
            SPARK_GLYPHS[level.min(SPARK_GLYPHS.len() - 1)]
        })
        .collect();

    Some(line)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_magnitude_thresholds() {
        assert_eq!(format_magnitude(Some(1_500_000_000.0), 2), "$1.50B");
        assert_eq!(format_magnitude(Some(2_450_000_000_000.0), 2), "$2.45T");
        assert_eq!(format_magnitude(Some(3_200_000.0), 2), "$3.20M");
        assert_eq!(format_magnitude(Some(1_000.0), 2), "$1.00K");
        assert_eq!(format_magnitude(Some(999.0), 2), "$999.00");
        assert_eq!(format_magnitude(Some(0.5), 1), "$0.5");
    }

    #[test]
    fn test_format_magnitude_missing() {
        assert_eq!(format_magnitude(None, 2), "-");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(Some(-3.456)), "-3.46%");
        assert_eq!(format_percentage(Some(52.3)), "52.30%");
        assert_eq!(format_percentage(None), "-");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(Some(2.114)), "▲ 2.11%");
        assert_eq!(format_change(Some(-3.456)), "▼ 3.46%");
        assert_eq!(format_change(None), "▲ 0.00%");
    }

    #[test]
    fn test_format_currency_large_amounts() {
        assert_eq!(format_currency(Some(43_250.5), "usd"), "$43,250.50");
        assert_eq!(format_currency(Some(1_234_567.891), "eur"), "€1,234,567.89");
        assert_eq!(format_currency(Some(1.0), "gbp"), "£1.00");
        assert_eq!(format_currency(Some(999.999), "usd"), "$1,000.00");
    }

    #[test]
    fn test_format_currency_sub_unit_precision() {
        assert_eq!(format_currency(Some(0.5), "usd"), "$0.5000");
        assert_eq!(format_currency(Some(0.000123456), "usd"), "$0.000123");
        assert_eq!(format_currency(Some(0.12345), "usd"), "$0.12345");
    }

    #[test]
    fn test_format_currency_unknown_code_does_not_fail() {
        assert_eq!(format_currency(Some(2.5), "btc"), "BTC 2.50");
        assert_eq!(format_currency(Some(2.5), "xyz"), "XYZ 2.50");
        assert_eq!(format_currency(None, "usd"), "-");
    }

    #[test]
    fn test_format_currency_negative() {
        // Tout montant < 1 (négatifs compris) prend 4 à 6 décimales
        assert_eq!(format_currency(Some(-1500.0), "usd"), "-$1,500.0000");
        assert_eq!(format_currency(Some(-0.0000001), "usd"), "$0.0000");
    }

    #[test]
    fn test_sparkline_glyphs() {
        assert_eq!(format_sparkline(&[1.0, 2.0, 3.0], 3).as_deref(), Some("▁▅█"));
        // Série plate : range = 1, tout au niveau bas
        assert_eq!(format_sparkline(&[5.0, 5.0], 10).as_deref(), Some("▁▁"));
        assert_eq!(format_sparkline(&[5.0], 10), None);
        assert_eq!(format_sparkline(&[], 10), None);
    }

    #[test]
    fn test_sparkline_resampling_keeps_endpoints() {
        let prices: Vec<f64> = (0..168).map(|i| i as f64).collect();
        let line = format_sparkline(&prices, 12).unwrap();
        assert_eq!(line.chars().count(), 12);
        assert_eq!(line.chars().next(), Some('▁'));
        assert_eq!(line.chars().last(), Some('█'));
    }

    #[test]
    fn test_sparkline_trend() {
        assert_eq!(sparkline_trend(&[1.0, 2.0]), Some(Trend::Up));
        assert_eq!(sparkline_trend(&[2.0, 2.0]), Some(Trend::Up));
        assert_eq!(sparkline_trend(&[2.0, 1.0]), Some(Trend::Down));
        assert_eq!(sparkline_trend(&[2.0]), None);
    }
}
