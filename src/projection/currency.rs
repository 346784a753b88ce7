// ============================================================================
// Currency Formatting
// ============================================================================
//
// Presentation helper for the query side. Balances are kept in minor
// currency units; queries answer with a euro string, whole units only,
// thousands grouped the Belgian way.
//
// ============================================================================

/// Format an amount in minor currency units as a euro string,
/// e.g. `70000` → `"€ 70.000"`.
pub fn format_eur(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("€ {sign}{grouped}")
}
