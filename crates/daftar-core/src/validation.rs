//! # Validation Module
//!
//! Input validation for catalog records, draft lines and cash entries.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI form                                                      │
//! │  ├── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules (required, positive, phone/email format)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Repositories and ledger                                      │
//! │  ├── Unique names, known ids, stock ceilings                           │
//! │                                                                         │
//! │  Everything here runs before any mutation.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted name, in characters.
pub const MAX_NAME_LEN: usize = 200;

/// Largest quantity on one line, merged lines included.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest stock an item may be given directly.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Largest unit amount, price, cost, payment or cash amount (10,000,000.00).
pub const MAX_AMOUNT: Money = Money::from_major(10_000_000);

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required name and returns it trimmed.
///
/// ```rust
/// use daftar_core::validation::validate_name;
///
/// assert_eq!(validate_name("name", "  Widget ").unwrap(), "Widget");
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(value.to_string())
}

/// Trims an optional free-text field; blank becomes `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validates and normalizes a Saudi mobile number.
///
/// ## Rules
/// Spaces, dashes and `+` are ignored. The remaining digits must be one of
/// `05xxxxxxxx`, `5xxxxxxxx` or `9665xxxxxxxx`. Blank input is `None`.
///
/// ```rust
/// use daftar_core::validation::validate_phone;
///
/// assert!(validate_phone(Some("+966 55 123 4567")).is_ok());
/// assert!(validate_phone(Some("0412345678")).is_err());
/// assert_eq!(validate_phone(Some("  ")).unwrap(), None);
/// ```
pub fn validate_phone(value: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(raw) = optional_text(value) else {
        return Ok(None);
    };

    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '+'))
        .collect();

    let subscriber = ["05", "9665", "5"]
        .iter()
        .find_map(|prefix| digits.strip_prefix(prefix));

    match subscriber {
        Some(rest) if rest.len() == 8 && rest.chars().all(|c| c.is_ascii_digit()) => {
            Ok(Some(raw))
        }
        _ => Err(ValidationError::invalid_format(
            "phone",
            "must be a Saudi mobile number such as 05xxxxxxxx",
        )),
    }
}

/// Validates an optional email address (`local@domain.tld`).
///
/// ```rust
/// use daftar_core::validation::validate_email;
///
/// assert!(validate_email(Some("owner@shop.sa")).is_ok());
/// assert!(validate_email(Some("owner@shop")).is_err());
/// ```
pub fn validate_email(value: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(email) = optional_text(value) else {
        return Ok(None);
    };

    let invalid = || ValidationError::invalid_format("email", "must look like name@domain.tld");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(Some(email)),
        _ => Err(invalid()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Line quantities must be positive and at most [`MAX_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::too_large("quantity", MAX_QUANTITY));
    }
    Ok(())
}

/// Line unit amounts must be positive.
pub fn validate_unit_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::must_be_positive("unit amount"));
    }
    amount_within_bounds("unit amount", amount)
}

/// Amount paid against a document; zero allowed.
pub fn validate_paid_amount(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::must_not_be_negative("paid amount"));
    }
    amount_within_bounds("paid amount", amount)
}

/// Item cost; zero allowed.
pub fn validate_cost(cost: Money) -> ValidationResult<()> {
    if cost.is_negative() {
        return Err(ValidationError::must_not_be_negative("cost"));
    }
    amount_within_bounds("cost", cost)
}

/// Item selling price; must be positive.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::must_be_positive("price"));
    }
    amount_within_bounds("price", price)
}

/// Stock on hand; zero allowed.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::must_not_be_negative("stock"));
    }
    if stock > MAX_STOCK {
        return Err(ValidationError::too_large("stock", MAX_STOCK));
    }
    Ok(())
}

/// Expense or revenue amount; must be positive.
pub fn validate_cash_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::must_be_positive("amount"));
    }
    amount_within_bounds("amount", amount)
}

fn amount_within_bounds(field: &str, amount: Money) -> ValidationResult<()> {
    if amount > MAX_AMOUNT {
        return Err(ValidationError::too_large(field, MAX_AMOUNT));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
