use crate::domain::account::PaymentRecord;
use crate::domain::account_repository::{PaymentLedger, StoreError};
use crate::domain::bundle::Bundle;
use std::sync::Arc;

/// Инструкции по оплате и ручное зачисление после проверки администратором.
pub struct PaymentService {
    ledger: Arc<dyn PaymentLedger>,
    unit_price: i64,
    admin_contact: String,
}

/// Идентификатор платежа, который пользователь передает администратору.
pub fn payment_reference(account_id: i64, credits: i64, price: i64) -> String {
    format!("PAY-{}-{}-{}", account_id, credits, price)
}

impl PaymentService {
    pub fn new(ledger: Arc<dyn PaymentLedger>, unit_price: i64, admin_contact: String) -> Self {
        Self {
            ledger,
            unit_price,
            admin_contact,
        }
    }

    pub fn unit_price(&self) -> i64 {
        self.unit_price
    }

    // Реальной оплаты нет: только инструкция и идентификатор для админа
    pub fn instructions(&self, account_id: i64, bundle: Bundle) -> String {
        format!(
            "Оплата {price} рублей за {credits} токенов.\n\n\
             Для оплаты переведите деньги на карту:\n\
             **** **** **** **** (Карта скрыта для безопасности)\n\n\
             После оплаты свяжитесь с администратором {admin} для подтверждения и пополнения баланса.\n\n\
             Идентификатор платежа: {reference}\n\
             Пожалуйста, укажите этот идентификатор при обращении к администратору.",
            price = bundle.price(),
            credits = bundle.credits(),
            admin = self.admin_contact,
            reference = payment_reference(account_id, bundle.credits(), bundle.price()),
        )
    }

    /// Ручное подтверждение оплаты администратором. Ни одна команда бота
    /// это не вызывает.
    pub async fn confirm_payment(
        &self,
        account_id: i64,
        credits: i64,
    ) -> Result<PaymentRecord, StoreError> {
        if credits <= 0 {
            return Err(StoreError::InvalidAmount(credits));
        }
        let amount_paid = credits
            .checked_mul(self.unit_price)
            .ok_or(StoreError::InvalidAmount(credits))?;
        let record = self
            .ledger
            .settle_top_up(account_id, amount_paid, credits)
            .await?;

        log::info!(
            "Платеж {} подтвержден: аккаунт {} +{} токенов ({} руб.)",
            record.id,
            account_id,
            credits,
            amount_paid
        );
        Ok(record)
    }
}
