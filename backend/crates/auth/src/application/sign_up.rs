//! Sign Up Use Case
//!
//! Creates an unverified account, mails its first verification code and
//! signs the new account in.

use platform::client::ClientMeta;
use platform::clock::SharedClock;
use platform::password::ClearTextPassword;

use crate::application::account_store::{AccountStore, NewAccount};
use crate::application::notify::Notifier;
use crate::application::sign_in::SignedIn;
use crate::application::token_service::TokenService;
use crate::domain::mail::MailGateway;
use crate::domain::repository::{AccountRepository, RefreshSessionRepository};
use crate::domain::services::VerificationThrottle;
use crate::domain::value_object::{email::Email, tenant::TenantType, token_claims::TokenSubject};
use crate::error::{AuthError, AuthResult};

const DISPLAY_NAME_MAX_CHARS: usize = 100;

/// Sign up input
pub struct SignUpInput {
    pub tenant: TenantType,
    pub email: String,
    pub password: String,
    /// Person's name, or the shop name for merchants
    pub name: String,
}

/// Sign up use case
pub struct SignUpUseCase<A, S, M> {
    accounts: AccountStore<A>,
    tokens: TokenService<S>,
    notifier: Notifier<M>,
    throttle: VerificationThrottle,
    clock: SharedClock,
}

impl<A, S, M> SignUpUseCase<A, S, M>
where
    A: AccountRepository,
    S: RefreshSessionRepository,
    M: MailGateway + Sync + 'static,
{
    pub fn new(
        accounts: AccountStore<A>,
        tokens: TokenService<S>,
        notifier: Notifier<M>,
        throttle: VerificationThrottle,
        clock: SharedClock,
    ) -> Self {
        Self {
            accounts,
            tokens,
            notifier,
            throttle,
            clock,
        }
    }

    pub async fn execute(&self, input: SignUpInput, meta: &ClientMeta) -> AuthResult<SignedIn> {
        let email = Email::parse(&input.email)?;
        let display_name = validate_display_name(&input.name)?;
        let password = ClearTextPassword::new(input.password)?;

        if self.accounts.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let now = self.clock.now();
        let code = self.throttle.initial_code(now)?;
        let account = self
            .accounts
            .create(
                NewAccount {
                    tenant: input.tenant,
                    email,
                    display_name,
                    password,
                },
                &code,
                now,
            )
            .await?;

        self.notifier.verification_code(&account.email, &code.code);

        let tokens = self.tokens.issue_pair(&TokenSubject::from(&account))?;
        self.tokens
            .persist(account.reference(), &tokens.refresh_token, meta)
            .await?;

        tracing::info!(
            account_id = %account.id,
            tenant = %account.tenant,
            "Account signed up"
        );

        Ok(SignedIn { account, tokens })
    }
}

fn validate_display_name(raw: &str) -> AuthResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidInput("Name is required"));
    }
    if name.chars().count() > DISPLAY_NAME_MAX_CHARS {
        return Err(AuthError::InvalidInput("Name is too long"));
    }
    Ok(name.to_string())
}
