use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{MailError, Mailer, OutgoingMail};

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        use_tls: bool,
    ) -> Result<Self, MailError> {
        let mut builder = if use_tls {
            let tls_params = TlsParameters::new(host.clone())
                .map_err(|e| MailError::InvalidConfig(format!("TLS configuration error: {}", e)))?;

            // 465 is implicit TLS, anything else negotiates STARTTLS
            if port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
                    .map_err(|e| MailError::InvalidConfig(format!("SMTP relay error: {}", e)))?
                    .port(port)
                    .tls(Tls::Wrapper(tls_params))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
                    .map_err(|e| MailError::InvalidConfig(format!("SMTP relay error: {}", e)))?
                    .port(port)
                    .tls(Tls::Required(tls_params))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host).port(port)
        };

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                mail.from
                    .parse()
                    .map_err(|e| MailError::InvalidConfig(format!("Invalid from address: {}", e)))?,
            )
            .to(mail
                .to
                .parse()
                .map_err(|e| MailError::SendFailed(format!("Invalid to address: {}", e)))?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| MailError::SendFailed(format!("Failed to build mail: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::SendFailed(e.to_string()))?;

        tracing::info!(to = %mail.to, "mail sent");
        Ok(())
    }
}
