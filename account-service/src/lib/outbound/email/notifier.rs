use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::account::errors::NotifierError;
use crate::account::models::EmailAddress;
use crate::account::ports::Notifier;
use crate::config::SmtpConfig;

/// SMTP-backed notifier.
///
/// Every send is attempt-once; callers treat failures as log-and-continue.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    /// Build a pooled SMTP transport from configuration.
    ///
    /// # Errors
    /// Returns an error when the relay host cannot be resolved into a
    /// transport configuration.
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifierError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| NotifierError::SendFailed(e.to_string()))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .port(config.port)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    async fn send(&self, to: &EmailAddress, subject: &str, body: String) -> Result<(), NotifierError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| NotifierError::InvalidMessage(format!("from address: {}", e)))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|e| NotifierError::InvalidMessage(format!("to address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| NotifierError::InvalidMessage(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifierError::SendFailed(e.to_string()))?;

        tracing::debug!(to = %to, subject, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_deletion_notice(&self, email: &EmailAddress) -> Result<(), NotifierError> {
        self.send(
            email,
            "Cuenta eliminada por inactividad",
            "Tu cuenta ha sido eliminada por inactividad en nuestro sitio web.".to_string(),
        )
        .await
    }

    async fn send_password_reset(
        &self,
        email: &EmailAddress,
        token: &str,
    ) -> Result<(), NotifierError> {
        let body = format!(
            "Hola,\n\n\
            Se solicitó un restablecimiento de contraseña para tu cuenta.\n\n\
            Usa el siguiente token para continuar:\n\n\
            {}\n\n\
            El token expira en 30 minutos. Si no solicitaste este cambio, \
            ignora este correo.",
            token
        );

        self.send(email, "Restablecimiento de contraseña", body).await
    }

    async fn send_product_removed(
        &self,
        email: &EmailAddress,
        product_name: &str,
    ) -> Result<(), NotifierError> {
        let body = format!(
            "Tu producto {} ha sido eliminado de la plataforma.",
            product_name
        );

        self.send(email, "Producto eliminado", body).await
    }
}
