use std::env;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("STATUSDECK_JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("STATUSDECK_JWT_SECRET not set, using insecure development secret");
            "statusdeck-dev-secret".to_string()
        });

        Self {
            jwt_secret,
            token_expiry_hours: env::var("STATUSDECK_TOKEN_EXPIRY_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
        }
    }
}
