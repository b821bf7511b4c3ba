pub mod command_router;
pub mod payment_usecase;
