use chrono::{DateTime, Utc};

/// Кто прислал команду. Поля профиля приходят из транспорта как есть.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub external_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Caller {
    pub fn new(external_id: i64) -> Self {
        Self {
            external_id,
            username: None,
            first_name: None,
            last_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub external_id: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub secondary_name: Option<String>,
    pub credits: i64,
    pub created_at: DateTime<Utc>,
    pub last_access_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PaymentRecord {
    pub id: i64,
    pub account_id: i64,
    pub amount_paid: i64,
    pub credits_granted: i64,
    pub recorded_at: DateTime<Utc>,
}
