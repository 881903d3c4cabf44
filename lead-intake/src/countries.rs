//! Static country list behind the searchable country-code selects

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub name: &'static str,
    pub iso: &'static str,
    pub dial_code: &'static str,
}

const fn c(name: &'static str, iso: &'static str, dial_code: &'static str) -> Country {
    Country { name, iso, dial_code }
}

/// Ordered the way the dropdown shows them: home market first, then alphabetical
pub static COUNTRIES: &[Country] = &[
    c("India", "IN", "+91"),
    c("Afghanistan", "AF", "+93"),
    c("Australia", "AU", "+61"),
    c("Bahrain", "BH", "+973"),
    c("Bangladesh", "BD", "+880"),
    c("Bhutan", "BT", "+975"),
    c("Canada", "CA", "+1"),
    c("Egypt", "EG", "+20"),
    c("Ethiopia", "ET", "+251"),
    c("France", "FR", "+33"),
    c("Germany", "DE", "+49"),
    c("Ghana", "GH", "+233"),
    c("Indonesia", "ID", "+62"),
    c("Iraq", "IQ", "+964"),
    c("Kazakhstan", "KZ", "+7"),
    c("Kenya", "KE", "+254"),
    c("Kuwait", "KW", "+965"),
    c("Malaysia", "MY", "+60"),
    c("Maldives", "MV", "+960"),
    c("Mauritius", "MU", "+230"),
    c("Myanmar", "MM", "+95"),
    c("Nepal", "NP", "+977"),
    c("Nigeria", "NG", "+234"),
    c("Oman", "OM", "+968"),
    c("Qatar", "QA", "+974"),
    c("Russia", "RU", "+7"),
    c("Rwanda", "RW", "+250"),
    c("Saudi Arabia", "SA", "+966"),
    c("Singapore", "SG", "+65"),
    c("Somalia", "SO", "+252"),
    c("South Africa", "ZA", "+27"),
    c("Sri Lanka", "LK", "+94"),
    c("Sudan", "SD", "+249"),
    c("Tanzania", "TZ", "+255"),
    c("Uganda", "UG", "+256"),
    c("United Arab Emirates", "AE", "+971"),
    c("United Kingdom", "GB", "+44"),
    c("United States", "US", "+1"),
    c("Uzbekistan", "UZ", "+998"),
    c("Yemen", "YE", "+967"),
    c("Zambia", "ZM", "+260"),
    c("Zimbabwe", "ZW", "+263"),
];

pub fn by_iso(iso: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.iso.eq_ignore_ascii_case(iso.trim()))
}

pub fn is_known_dial_code(code: &str) -> bool {
    let code = code.trim();
    COUNTRIES.iter().any(|c| c.dial_code == code)
}

/// Countries matching `query`, best matches first.
///
/// Name prefix matches rank ahead of other name matches; ISO codes match
/// exactly and dial codes by prefix (with or without the leading `+`).
/// A blank query returns the whole list.
pub fn search(query: &str) -> Vec<&'static Country> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return COUNTRIES.iter().collect();
    }

    let digits = query.trim_start_matches('+');
    let dial_query = !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit());

    let mut prefix = Vec::new();
    let mut rest = Vec::new();
    for country in COUNTRIES {
        let name = country.name.to_lowercase();
        if name.starts_with(&query) || name.split(' ').any(|word| word.starts_with(&query)) {
            prefix.push(country);
        } else if name.contains(&query)
            || country.iso.eq_ignore_ascii_case(&query)
            || (dial_query && country.dial_code[1..].starts_with(digits))
        {
            rest.push(country);
        }
    }
    prefix.extend(rest);
    prefix
}
