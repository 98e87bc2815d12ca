//! Payment Models

use crate::error::{AppError, AppResult, ErrorCode};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Payment history entries kept locally
pub const HISTORY_LIMIT: usize = 10;
/// Saved cards kept locally
pub const SAVED_CARD_LIMIT: usize = 5;

/// Fare for `hours` of parking at a flat daily rate
pub fn fare_for_duration(fare_per_day: i64, hours: u32) -> Decimal {
    (Decimal::from(fare_per_day) * Decimal::from(hours) / Decimal::from(24)).round_dp(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Nequi,
    Daviplata,
}

impl PaymentMethod {
    /// Card payments need [`CardDetails`]; wallets do not
    pub fn requires_card(&self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CreditCard => "Credit Card",
            Self::DebitCard => "Debit Card",
            Self::Nequi => "Nequi",
            Self::Daviplata => "Daviplata",
        }
    }
}

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn validate_card_number(value: &str) -> Result<(), ValidationError> {
    let d = digits(value);
    if d.len() == 16 && value.chars().all(|c| c.is_ascii_digit() || c == ' ') {
        Ok(())
    } else {
        Err(ValidationError::new("card_number"))
    }
}

fn validate_cvv(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("cvv"))
    }
}

/// `MM/YY` → (month, two-digit year)
fn parse_expiry(value: &str) -> Option<(u32, u32)> {
    let (month, year) = value.split_once('/')?;
    if month.len() != 2 || year.len() != 2 {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let year: u32 = year.parse().ok()?;
    (1..=12).contains(&month).then_some((month, year))
}

fn validate_expiry_format(value: &str) -> Result<(), ValidationError> {
    parse_expiry(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("expiry"))
}

/// Card as typed into the payment form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CardDetails {
    #[validate(custom(
        function = "validate_card_number",
        message = "Card number must be 16 digits"
    ))]
    pub number: String,
    #[validate(length(min = 3, message = "Please enter full name"))]
    pub holder_name: String,
    #[validate(custom(function = "validate_expiry_format", message = "Invalid expiry date"))]
    pub expiry: String,
    #[validate(custom(function = "validate_cvv", message = "CVV must be 3 digits"))]
    pub cvv: String,
}

impl CardDetails {
    pub fn last_four(&self) -> String {
        let d = digits(&self.number);
        d[d.len().saturating_sub(4)..].to_string()
    }

    /// Expired when the expiry month lies before `today`'s month
    pub fn is_expired_at(&self, today: NaiveDate) -> bool {
        match parse_expiry(&self.expiry) {
            Some((month, year)) => {
                let current_year = (today.year() % 100) as u32;
                year < current_year || (year == current_year && month < today.month())
            }
            None => true,
        }
    }

    /// Form validation plus the expiry check against `today`
    pub fn check(&self, today: NaiveDate) -> AppResult<()> {
        self.validate()?;
        if self.is_expired_at(today) {
            return Err(AppError::new(ErrorCode::PaymentCardExpired)
                .with_detail("expiry", "Card has expired"));
        }
        Ok(())
    }
}

/// What the driver submits at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    pub card: Option<CardDetails>,
    /// Remember the card (last four digits and holder only)
    #[serde(default)]
    pub save_card: bool,
}

impl PaymentRequest {
    pub fn wallet(method: PaymentMethod) -> Self {
        Self {
            method,
            card: None,
            save_card: false,
        }
    }

    pub fn card(method: PaymentMethod, card: CardDetails, save_card: bool) -> Self {
        Self {
            method,
            card: Some(card),
            save_card,
        }
    }

    pub fn check(&self, today: NaiveDate) -> AppResult<()> {
        if !self.method.requires_card() {
            return Ok(());
        }
        match &self.card {
            Some(card) => card.check(today),
            None => Err(AppError::with_message(
                ErrorCode::PaymentInvalidCard,
                "Card number is required",
            )),
        }
    }

    pub fn last_four(&self) -> String {
        self.card.as_ref().map(CardDetails::last_four).unwrap_or_default()
    }
}

/// One completed payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub parking_lot_name: String,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
    pub last_four_digits: String,
}

/// A remembered card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCard {
    pub id: Uuid,
    pub last_four_digits: String,
    pub card_holder_name: String,
    pub is_default: bool,
}

impl SavedCard {
    pub fn new(
        last_four_digits: impl Into<String>,
        card_holder_name: impl Into<String>,
        is_default: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            last_four_digits: last_four_digits.into(),
            card_holder_name: card_holder_name.into(),
            is_default,
        }
    }
}

/// Newest first, capped at [`HISTORY_LIMIT`]
pub fn push_history(history: &mut Vec<PaymentRecord>, record: PaymentRecord) {
    history.insert(0, record);
    history.truncate(HISTORY_LIMIT);
}

/// Newest first, one card per last-four, capped at [`SAVED_CARD_LIMIT`]
pub fn push_saved_card(cards: &mut Vec<SavedCard>, card: SavedCard) {
    if card.is_default {
        for existing in cards.iter_mut() {
            existing.is_default = false;
        }
    }
    cards.retain(|c| c.last_four_digits != card.last_four_digits);
    cards.insert(0, card);
    cards.truncate(SAVED_CARD_LIMIT);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 27).unwrap()
    }

    fn card(expiry: &str) -> CardDetails {
        CardDetails {
            number: "4111 1111 1111 1234".into(),
            holder_name: "Ana Ruiz".into(),
            expiry: expiry.into(),
            cvv: "123".into(),
        }
    }

    #[test]
    fn test_fare_is_prorated_by_hour() {
        assert_eq!(fare_for_duration(24_000, 3), Decimal::from(3_000));
        assert_eq!(fare_for_duration(10_000, 1), "416.67".parse::<Decimal>().unwrap());
        assert_eq!(fare_for_duration(24_000, 24), Decimal::from(24_000));
    }

    #[test]
    fn test_card_validation() {
        assert!(card("12/26").check(today()).is_ok());
        assert_eq!(card("12/26").last_four(), "1234");

        let mut short = card("12/26");
        short.number = "4111".into();
        short.cvv = "12".into();
        let err = short.check(today()).unwrap_err();
        let fields = err.field_errors();
        assert!(fields.contains_key("number"));
        assert!(fields.contains_key("cvv"));

        assert!(card("13/26").check(today()).is_err());
    }

    #[test]
    fn test_expiry_compares_month_and_year() {
        assert!(!card("11/24").is_expired_at(today()));
        assert!(card("10/24").is_expired_at(today()));
        assert!(card("01/23").is_expired_at(today()));
        assert_eq!(
            card("10/24").check(today()).unwrap_err().code,
            ErrorCode::PaymentCardExpired
        );
    }

    #[test]
    fn test_wallets_need_no_card() {
        assert!(PaymentRequest::wallet(PaymentMethod::Nequi).check(today()).is_ok());
        let missing = PaymentRequest {
            method: PaymentMethod::CreditCard,
            card: None,
            save_card: false,
        };
        assert_eq!(
            missing.check(today()).unwrap_err().code,
            ErrorCode::PaymentInvalidCard
        );
    }

    #[test]
    fn test_history_keeps_newest_ten() {
        let mut history = Vec::new();
        for i in 0..12 {
            push_history(
                &mut history,
                PaymentRecord {
                    parking_lot_name: format!("Lot {i}"),
                    amount: Decimal::from(i),
                    paid_at: Utc::now(),
                    last_four_digits: "1234".into(),
                },
            );
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].parking_lot_name, "Lot 11");
        assert_eq!(history[9].parking_lot_name, "Lot 2");
    }

    #[test]
    fn test_saved_cards_default_and_dedup() {
        let mut cards = Vec::new();
        push_saved_card(&mut cards, SavedCard::new("1111", "Ana", true));
        push_saved_card(&mut cards, SavedCard::new("2222", "Ana", true));
        assert_eq!(cards.iter().filter(|c| c.is_default).count(), 1);
        assert_eq!(cards[0].last_four_digits, "2222");

        push_saved_card(&mut cards, SavedCard::new("1111", "Ana R", false));
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].card_holder_name, "Ana R");
        assert!(cards[1].is_default);

        for n in 3..9 {
            push_saved_card(&mut cards, SavedCard::new(format!("{n}{n}{n}{n}"), "Ana", false));
        }
        assert_eq!(cards.len(), SAVED_CARD_LIMIT);
    }
}
