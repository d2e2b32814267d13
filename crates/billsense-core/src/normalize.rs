//! Merchant name normalization
//!
//! Bank descriptions for the same payee vary per transaction: card-wallet
//! prefixes, store numbers, reference codes and domain suffixes. The merchant
//! key strips those so one real bill does not fragment into several groups.
//! The key feeds bill ids, so it must stay a pure function of its input.

/// Payment method prefixes that vary per transaction
const PAYMENT_PREFIXES: &[&str] = &[
    "APLPAY ",
    "APPLEPAY ",
    "APPLE PAY ",
    "GOOGLE PAY ",
    "SQ * ",
    "SQ *",
    "SP * ",
    "SP *",
    "TST* ",
    "TST*",
    "PAYPAL *",
    "PAYPAL*",
    "CARD PAYMENT TO ",
    "DIRECT DEBIT ",
    "DD ",
    "POS ",
];

/// Tokens that carry no payee identity
const NOISE_TOKENS: &[&str] = &[
    "DEBIT", "CARD", "PURCHASE", "PAYMENT", "ONLINE", "ACH", "REF", "TRX", "TXN", "AUTH",
    "PENDING", "VISA", "MC", "WWW", "COM", "CO", "UK", "NET", "ORG", "LTD", "LIMITED", "PLC",
    "INC", "LLC", "GBP", "USD", "EUR",
];

/// Maximum number of significant words kept in a key
const KEY_WORDS: usize = 3;

/// Normalize a raw payee string into a grouping key
pub fn merchant_key(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();

    let mut stripped = upper.as_str();
    loop {
        let before = stripped.len();
        for prefix in PAYMENT_PREFIXES {
            stripped = stripped.trim_start_matches(prefix).trim_start();
        }
        if stripped.len() == before {
            break;
        }
    }

    let punctuation_free: String = stripped
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let key = punctuation_free
        .split_whitespace()
        .filter(|token| !NOISE_TOKENS.contains(token))
        .filter(|token| !is_reference_token(token))
        .take(KEY_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if key.is_empty() {
        // Everything was noise; keep the raw text so distinct payees stay distinct
        return upper.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    }

    key
}

/// Numeric ids, store numbers and reference codes like `X1234` or `GB12345678`
fn is_reference_token(token: &str) -> bool {
    let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
    digits == token.chars().count() || digits >= 4
}

/// Human-readable name derived from a merchant key
pub fn display_name(key: &str) -> String {
    key.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
