//! Money formatting utilities for displaying monetary amounts.
//!
//! Amounts are stored as integer minor units (paise for INR, cents otherwise).
//!
//! Grouping follows the locale:
//! - `en-IN`: lakh/crore grouping, e.g. 1,23,45,678.90
//! - European locales: period for thousands, comma for decimals
//! - everything else: comma for thousands, period for decimals

/// Format minor units as an unsigned amount, e.g. prices and payments.
pub fn format_money(cents: i64, currency: &str, locale: &str) -> String {
    let abs_cents = cents.abs();
    let whole = abs_cents / 100;
    let fractional = abs_cents % 100;

    let (group_sep, decimal_sep) = locale_separators(locale);
    let whole_str = group_digits(whole, group_sep, uses_indian_grouping(locale));
    let symbol = currency_symbol(currency);

    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{}{}{}{:02}", sign, symbol, whole_str, decimal_sep, fractional)
}

/// Format minor units as an HTML span colored for profit or loss.
pub fn format_money_colored(cents: i64, currency: &str, locale: &str) -> String {
    let color_class = if cents > 0 {
        "money-positive"
    } else if cents < 0 {
        "money-negative"
    } else {
        "muted"
    };
    format!(
        r#"<span class="{}">{}</span>"#,
        color_class,
        format_money(cents, currency, locale)
    )
}

/// Render minor units as a plain decimal string for form inputs ("1234.50").
pub fn cents_to_input(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

/// Get grouping and decimal separators based on locale.
fn locale_separators(locale: &str) -> (char, char) {
    match locale {
        "de-DE" | "de-AT" | "fr-FR" | "es-ES" | "it-IT" | "pt-BR" | "nl-NL" | "pl-PL"
        | "ru-RU" | "tr-TR" | "id-ID" | "da-DK" | "nb-NO" | "sv-SE" => ('.', ','),
        _ => (',', '.'),
    }
}

fn uses_indian_grouping(locale: &str) -> bool {
    matches!(locale, "en-IN" | "hi-IN" | "mr-IN" | "ta-IN" | "te-IN" | "bn-IN")
}

/// Group the digits of `n`. Indian grouping keeps the last three digits
/// together and then groups by two.
fn group_digits(n: i64, sep: char, indian: bool) -> String {
    let digits: Vec<char> = n.to_string().chars().rev().collect();
    let mut result = Vec::with_capacity(digits.len() + digits.len() / 2);

    for (i, c) in digits.iter().enumerate() {
        let boundary = if indian {
            i == 3 || (i > 3 && (i - 3) % 2 == 0)
        } else {
            i > 0 && i % 3 == 0
        };
        if boundary {
            result.push(sep);
        }
        result.push(*c);
    }

    result.iter().rev().collect()
}

/// Get currency symbol for a currency code.
fn currency_symbol(currency: &str) -> &'static str {
    match currency.to_uppercase().as_str() {
        "INR" => "\u{20b9}",
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{00a3}",
        "JPY" => "\u{00a5}",
        "AED" => "AED\u{00a0}",
        "SGD" => "S$",
        "LKR" => "Rs\u{00a0}",
        "NPR" => "Rs\u{00a0}",
        _ => "\u{20b9}",
    }
}
