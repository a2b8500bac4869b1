use crate::http_error::AppError;
use crate::plugins::auth::models::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest, UserDto,
};
use crate::plugins::auth::repo::DynUserRepo;
use crate::plugins::shared::MessageResponse;
use crate::services::mail::MailService;
use crate::services::password::PasswordService;
use crate::services::token::TokenService;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService {
    users: DynUserRepo,
    passwords: PasswordService,
    access_tokens: TokenService,
    reset_tokens: TokenService,
    mail: MailService,
    base_url_fe: String,
}

impl AuthService {
    pub fn new(
        users: DynUserRepo,
        passwords: PasswordService,
        access_tokens: TokenService,
        reset_tokens: TokenService,
        mail: MailService,
        base_url_fe: impl Into<String>,
    ) -> Self {
        Self {
            users,
            passwords,
            access_tokens,
            reset_tokens,
            mail,
            base_url_fe: base_url_fe.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn access_tokens(&self) -> &TokenService {
        &self.access_tokens
    }

    pub fn reset_tokens(&self) -> &TokenService {
        &self.reset_tokens
    }

    pub async fn register(&self, body: RegisterRequest) -> Result<UserDto, AppError> {
        if self.users.find_by_email(&body.email).await?.is_some() {
            return Err(AppError::bad_request("Email already exist"));
        }

        let hashed = self.passwords.hash_password(&body.password).await?;
        let user = self.users.insert(&body.name, &body.email, &hashed).await?;
        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, body: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = self
            .users
            .find_by_email(&body.email)
            .await?
            .ok_or_else(|| AppError::bad_request(INVALID_CREDENTIALS))?;

        if !self.passwords.compare_password(&body.password, &user.password).await? {
            return Err(AppError::bad_request(INVALID_CREDENTIALS));
        }

        let access_token = self.access_tokens.generate_token(user.id)?;
        Ok(LoginResponse { user: user.into_dto(), access_token })
    }

    pub async fn forgot_password(&self, body: ForgotPasswordRequest) -> Result<MessageResponse, AppError> {
        let user = self
            .users
            .find_by_email(&body.email)
            .await?
            .ok_or_else(|| AppError::bad_request("Invalid email address"))?;

        let token = self.reset_tokens.generate_token(user.id)?;
        let link = format!("{}/reset-password/{token}", self.base_url_fe);
        let expiry_hours = (self.reset_tokens.ttl().as_secs() / 3600).max(1);

        self.mail
            .send_email(
                &user.email,
                "Link reset password",
                "forgot-password",
                &[("name", user.name), ("resetLink", link), ("expiryTime", expiry_hours.to_string())],
            )
            .await?;

        Ok(MessageResponse::new("Send email success"))
    }

    pub async fn reset_password(&self, body: ResetPasswordRequest, auth_user_id: i64) -> Result<MessageResponse, AppError> {
        let user = self
            .users
            .find_by_id(auth_user_id)
            .await?
            .ok_or_else(|| AppError::bad_request("User not found"))?;

        let hashed = self.passwords.hash_password(&body.password).await?;
        self.users.update_password(user.id, &hashed).await?;
        tracing::info!(user_id = user.id, "password reset");
        Ok(MessageResponse::new("Reset password success"))
    }
}
