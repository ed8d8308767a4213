use rand::Rng;
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub const OTP_TTL: Duration = Duration::minutes(5);

/// Random 6-digit numeric code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

#[derive(Debug, Clone, FromRow)]
pub struct OtpRecord {
    pub user_id: Uuid,
    pub code: String,
    pub expires_at: OffsetDateTime,
}

impl OtpRecord {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    /// Insert or replace the single live code for this user.
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_codes (user_id, code, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET code = $2, expires_at = $3
            "#,
        )
        .bind(user_id)
        .bind(code)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn find_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<OtpRecord>> {
        let record = sqlx::query_as::<_, OtpRecord>(
            "SELECT user_id, code, expires_at FROM otp_codes WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    /// Idempotent cleanup after successful verification.
    pub async fn delete_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM otp_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn expiry_is_a_strict_deadline() {
        let now = OffsetDateTime::now_utc();
        let record = OtpRecord {
            user_id: Uuid::new_v4(),
            code: "123456".into(),
            expires_at: now + OTP_TTL,
        };
        assert!(!record.is_expired(now));
        assert!(!record.is_expired(now + OTP_TTL));
        assert!(record.is_expired(now + OTP_TTL + Duration::seconds(1)));
    }
}
