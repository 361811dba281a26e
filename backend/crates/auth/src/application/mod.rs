//! Application Layer
//!
//! Use cases and application services.

pub mod account_store;
pub mod config;
pub mod current_account;
pub mod gateway;
pub mod notify;
pub mod password_reset;
pub mod refresh;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod token_service;
pub mod verification;

// Re-exports
pub use account_store::{AccountStore, NewAccount, PasswordCheck};
pub use config::{AuthConfig, ConfigError};
pub use current_account::CurrentAccountUseCase;
pub use gateway::{AuthGateway, AuthStore};
pub use notify::Notifier;
pub use password_reset::{ForgotPasswordUseCase, ResetPasswordInput, ResetPasswordUseCase};
pub use refresh::RefreshUseCase;
pub use sign_in::{SignInInput, SignInUseCase, SignedIn};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpUseCase};
pub use token_service::{Rotation, TokenPair, TokenService};
pub use verification::{ResendVerificationUseCase, VerifyEmailUseCase};
