//! Email service for sending transactional emails.
//!
//! Uses `lettre` for SMTP transport. Documents (quotes and invoices) are
//! sent as plain-text bodies with the rendered PDF attached.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build()
            .pipe(Ok)
    }

    /// Sends an invoice to a customer with the PDF attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_invoice_email(
        &self,
        to_email: &str,
        customer_name: &str,
        invoice_number: &str,
        total: &str,
        due_date: &str,
        company_name: &str,
        pdf: Vec<u8>,
    ) -> Result<(), EmailError> {
        let subject = format!("Invoice {invoice_number} from {company_name}");
        let body = format!(
            r"Hi {customer_name},

Please find attached invoice {invoice_number} for {total}.

Payment is due by {due_date}.

Best regards,
{company_name}"
        );

        self.send_with_pdf(to_email, &subject, &body, &format!("{invoice_number}.pdf"), pdf)
            .await
    }

    /// Sends a quote to a customer with the PDF attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_quote_email(
        &self,
        to_email: &str,
        customer_name: &str,
        quote_number: &str,
        total: &str,
        valid_until: &str,
        company_name: &str,
        pdf: Vec<u8>,
    ) -> Result<(), EmailError> {
        let subject = format!("Quote {quote_number} from {company_name}");
        let body = format!(
            r"Hi {customer_name},

Please find attached quote {quote_number} for {total}.

This quote is valid until {valid_until}.

Best regards,
{company_name}"
        );

        self.send_with_pdf(to_email, &subject, &body, &format!("{quote_number}.pdf"), pdf)
            .await
    }

    /// Sends a generic plain-text email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let email = self
            .message_builder(to_email, subject)?
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        self.deliver(email).await
    }

    /// Sends a plain-text email with a PDF attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_with_pdf(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
        filename: &str,
        pdf: Vec<u8>,
    ) -> Result<(), EmailError> {
        let pdf_type = ContentType::parse("application/pdf")
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let email = self
            .message_builder(to_email, subject)?
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body.to_string()))
                    .singlepart(Attachment::new(filename.to_string()).body(pdf, pdf_type)),
            )
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        self.deliver(email).await
    }

    fn message_builder(
        &self,
        to_email: &str,
        subject: &str,
    ) -> Result<lettre::message::MessageBuilder, EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        Ok(Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject))
    }

    async fn deliver(&self, email: Message) -> Result<(), EmailError> {
        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }
}

/// Pipe trait for fluent API.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_config_default() {
        let config = EmailConfig::default();
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 1025);
    }

    #[test]
    fn test_invalid_recipient_address() {
        let service = EmailService::new(EmailConfig::default());
        let result = service.message_builder("not-an-address", "subject");
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }
}
