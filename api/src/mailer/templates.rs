use std::time::Duration;

/// Subject and body of the mail that carries an activation link.
pub struct ActivationEmail {
    pub subject: String,
    pub body: String,
}

impl ActivationEmail {
    pub fn new(username: &str, activation_url: &str, valid_for: Duration) -> Self {
        let valid_for = describe(valid_for);
        Self {
            subject: "[parkslab] Complete your registration".to_string(),
            body: format!(
                r#"Hello {username},

Thank you for registering with parkslab.
Open the link below to activate your account:

{activation_url}

The link is valid for {valid_for}. If you did not sign up, you
can ignore this message.

--
parkslab"#
            ),
        }
    }
}

fn describe(period: Duration) -> String {
    let secs = period.as_secs();
    match secs {
        s if s >= 3600 && s % 3600 == 0 => format!("{} hours", s / 3600),
        s if s >= 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        s => format!("{} seconds", s),
    }
}
