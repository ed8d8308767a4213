use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_key: String,
    pub api_url: String,
    pub from_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub admin_email: String,
    /// Session cookie policy: Secure + SameSite=None when true, Lax otherwise.
    pub production: bool,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let admin_email = std::env::var("ADMIN_EMAIL")
            .unwrap_or_default()
            .to_lowercase();
        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_days: std::env::var("JWT_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };
        let mail = MailConfig {
            api_key: std::env::var("SENDGRID_API_KEY")?,
            api_url: std::env::var("SENDGRID_API_URL")
                .unwrap_or_else(|_| "https://api.sendgrid.com/v3/mail/send".into()),
            from_email: std::env::var("SENDGRID_EMAIL")?,
        };
        let storage = StorageConfig {
            endpoint: std::env::var("S3_ENDPOINT")?,
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "blog-uploads".into()),
            access_key: std::env::var("S3_ACCESS_KEY")?,
            secret_key: std::env::var("S3_SECRET_KEY")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            public_base_url: std::env::var("S3_PUBLIC_BASE_URL")?,
        };
        Ok(Self {
            database_url,
            admin_email,
            production,
            jwt,
            mail,
            storage,
        })
    }
}
