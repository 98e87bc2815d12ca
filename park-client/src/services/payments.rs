//! Fares, simulated payment processing and local payment data

use crate::local::{LocalStore, keys};
use crate::ClientResult;
use crate::config::{DEFAULT_PAYMENT_SUCCESS_RATE, normalize_success_rate};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::payment::{
    self, PaymentMethod, PaymentRecord, PaymentRequest, SavedCard, fare_for_duration,
};
use shared::models::ParkingLot;
use std::sync::Arc;
use std::time::Duration;

/// Charges a payment; true when it went through
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn process(&self, amount: Decimal, request: &PaymentRequest) -> bool;
}

/// Accepts a payment with a fixed probability
#[derive(Debug, Clone)]
pub struct SimulatedProcessor {
    success_rate: f64,
    delay: Duration,
}

impl SimulatedProcessor {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: normalize_success_rate(success_rate),
            delay: Duration::ZERO,
        }
    }

    /// Pretend processing takes this long
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for SimulatedProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_SUCCESS_RATE)
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedProcessor {
    async fn process(&self, amount: Decimal, request: &PaymentRequest) -> bool {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let approved = rand::thread_rng().gen_bool(self.success_rate);
        tracing::info!(%amount, method = request.method.label(), approved, "Simulated payment");
        approved
    }
}

#[derive(Clone)]
pub struct PaymentService {
    local: LocalStore,
    processor: Arc<dyn PaymentProcessor>,
}

impl PaymentService {
    pub fn new(local: LocalStore, processor: Arc<dyn PaymentProcessor>) -> Self {
        Self { local, processor }
    }

    /// Fare for `hours` at `lot`
    pub fn fare(&self, lot: &ParkingLot, hours: u32) -> Decimal {
        fare_for_duration(lot.fare_per_day, hours)
    }

    /// Run the payment through the processor
    pub async fn charge(&self, request: &PaymentRequest, amount: Decimal) -> ClientResult<()> {
        if self.processor.process(amount, request).await {
            Ok(())
        } else {
            Err(AppError::with_message(ErrorCode::PaymentFailed, "Payment failed. Please try again.")
                .into())
        }
    }

    /// Remember a completed payment and, when asked, the card used
    pub fn record(
        &self,
        request: &PaymentRequest,
        parking_lot_name: &str,
        amount: Decimal,
    ) -> PaymentRecord {
        let record = PaymentRecord {
            parking_lot_name: parking_lot_name.to_string(),
            amount,
            paid_at: Utc::now(),
            last_four_digits: request.last_four(),
        };

        let entry = record.clone();
        if let Err(e) = self.local.update(keys::PAYMENT_HISTORY, |history: &mut Vec<PaymentRecord>| {
            payment::push_history(history, entry)
        }) {
            tracing::error!(error = %e, "Saving payment history failed");
        }

        if request.save_card
            && request.method == PaymentMethod::CreditCard
            && let Some(card) = &request.card
        {
            let saved = SavedCard::new(card.last_four(), card.holder_name.trim(), true);
            if let Err(e) = self.local.update(keys::SAVED_CARDS, |cards: &mut Vec<SavedCard>| {
                payment::push_saved_card(cards, saved)
            }) {
                tracing::error!(error = %e, "Saving card failed");
            }
        }

        record
    }

    /// Newest first
    pub fn history(&self) -> Vec<PaymentRecord> {
        self.local
            .get(keys::PAYMENT_HISTORY)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Reading payment history failed");
                None
            })
            .unwrap_or_default()
    }

    /// Newest first
    pub fn saved_cards(&self) -> Vec<SavedCard> {
        self.local
            .get(keys::SAVED_CARDS)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Reading saved cards failed");
                None
            })
            .unwrap_or_default()
    }

    pub fn default_card(&self) -> Option<SavedCard> {
        self.saved_cards().into_iter().find(|c| c.is_default)
    }

    /// Forget history and cards
    pub fn clear(&self) -> ClientResult<()> {
        self.local.remove(keys::PAYMENT_HISTORY)?;
        self.local.remove(keys::SAVED_CARDS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::payment::CardDetails;

    fn service(rate: f64) -> PaymentService {
        PaymentService::new(
            LocalStore::open_in_memory().unwrap(),
            Arc::new(SimulatedProcessor::new(rate)),
        )
    }

    fn card_request(number: &str, save: bool) -> PaymentRequest {
        PaymentRequest::card(
            PaymentMethod::CreditCard,
            CardDetails {
                number: number.into(),
                holder_name: "Ana Ruiz".into(),
                expiry: "12/30".into(),
                cvv: "123".into(),
            },
            save,
        )
    }

    #[tokio::test]
    async fn test_processor_extremes() {
        let request = PaymentRequest::wallet(PaymentMethod::Nequi);
        assert!(service(1.0).charge(&request, Decimal::ONE).await.is_ok());

        let err = service(0.0).charge(&request, Decimal::ONE).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::PaymentFailed);
    }

    #[tokio::test]
    async fn test_nan_success_rate_does_not_panic() {
        let processor = SimulatedProcessor::new(f64::NAN);
        assert_eq!(processor.success_rate, DEFAULT_PAYMENT_SUCCESS_RATE);

        let request = PaymentRequest::wallet(PaymentMethod::Nequi);
        let _ = processor.process(Decimal::ONE, &request).await;
    }

    #[test]
    fn test_history_and_cards_persist() {
        let service = service(1.0);
        service.record(&card_request("4111111111111111", true), "Lot A", Decimal::from(1000));
        service.record(&card_request("4111111111112222", true), "Lot B", Decimal::from(2000));
        service.record(&card_request("4111111111113333", false), "Lot C", Decimal::from(3000));
        service.record(&PaymentRequest::wallet(PaymentMethod::Daviplata), "Lot D", Decimal::ONE);

        let history = service.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].parking_lot_name, "Lot D");
        assert_eq!(history[0].last_four_digits, "");
        assert_eq!(history[1].last_four_digits, "3333");

        let cards = service.saved_cards();
        assert_eq!(cards.len(), 2);
        assert_eq!(service.default_card().unwrap().last_four_digits, "2222");

        service.clear().unwrap();
        assert!(service.history().is_empty());
    }

    #[test]
    fn test_debit_cards_are_not_saved() {
        let service = service(1.0);
        let mut request = card_request("4111111111111111", true);
        request.method = PaymentMethod::DebitCard;
        service.record(&request, "Lot A", Decimal::ONE);
        assert!(service.saved_cards().is_empty());
    }
}
