use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl User {
    pub async fn find_by_id(db: &sqlx::SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_username(
        db: &sqlx::SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(db)
            .await
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl CreateUser {
    /// Field rules a registration form enforces before anything is stored.
    pub fn validate(&self) -> Result<(), String> {
        let username_ok = !self.username.is_empty()
            && self.username.chars().count() <= 150
            && self
                .username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c));
        if !username_ok {
            return Err(
                "Username must be 1-150 characters of letters, digits and @/./+/-/_".to_string(),
            );
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("Enter a valid email address".to_string());
        }
        if self.password.chars().count() < 8 {
            return Err("Password must contain at least 8 characters".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub redirect_to: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub next: String,
}

#[derive(Debug, Serialize)]
pub struct ActivatedResponse {
    pub message: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(username: &str, email: &str, password: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(payload("hanako.y", "hanako@example.com", "correct horse")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_rejects_bad_username() {
        assert!(payload("", "a@example.com", "longenough").validate().is_err());
        assert!(payload("has space", "a@example.com", "longenough")
            .validate()
            .is_err());
        assert!(payload(&"x".repeat(151), "a@example.com", "longenough")
            .validate()
            .is_err());
    }

    #[test]
    fn test_rejects_bad_email_and_short_password() {
        assert!(payload("taro", "not-an-email", "longenough")
            .validate()
            .is_err());
        assert!(payload("taro", "taro@example.com", "short").validate().is_err());
    }
}
