/// Пакет токенов для пополнения. У каждого своя команда `/buy_N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bundle {
    Credits10,
    Credits25,
    Credits50,
    Credits100,
}

impl Bundle {
    pub const ALL: [Bundle; 4] = [
        Bundle::Credits10,
        Bundle::Credits25,
        Bundle::Credits50,
        Bundle::Credits100,
    ];

    pub fn credits(self) -> i64 {
        match self {
            Bundle::Credits10 => 10,
            Bundle::Credits25 => 25,
            Bundle::Credits50 => 50,
            Bundle::Credits100 => 100,
        }
    }

    // Цены фиксированы, не пересчитываются из CREDIT_PRICE
    pub fn price(self) -> i64 {
        match self {
            Bundle::Credits10 => 100,
            Bundle::Credits25 => 250,
            Bundle::Credits50 => 500,
            Bundle::Credits100 => 1000,
        }
    }

    pub fn command(self) -> &'static str {
        match self {
            Bundle::Credits10 => "/buy_10",
            Bundle::Credits25 => "/buy_25",
            Bundle::Credits50 => "/buy_50",
            Bundle::Credits100 => "/buy_100",
        }
    }
}
