//! Transactional email over a third-party HTTP API.
//!
//! Messages are rendered with Askama (HTML and plain text) and posted as JSON
//! to `{EMAIL_API_URL}/send` with a bearer key. Without a key the service runs
//! in mock mode: messages are logged and the most recent ones are kept in a
//! bounded in-memory outbox.

use std::collections::VecDeque;
use std::sync::Arc;

use askama::Template;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use marigold_core::order::Order;
use marigold_core::{Email, Money};

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// One rendered message, in the shape the send API accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// A line item flattened to display strings for the templates.
struct EmailLine {
    label: String,
    quantity: u32,
    unit_price: Money,
    line_total: Money,
}

fn email_lines(order: &Order) -> Vec<EmailLine> {
    order
        .items
        .iter()
        .map(|item| {
            let variant: Vec<&str> = [item.color.as_deref(), item.size.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            let label = if variant.is_empty() {
                item.title.clone()
            } else {
                format!("{} ({})", item.title, variant.join(", "))
            };
            EmailLine {
                label,
                quantity: item.quantity,
                unit_price: item.price,
                line_total: item.line_total(),
            }
        })
        .collect()
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<h1>Thanks for your order, {{ name }}!</h1>
<p>Order #{{ order_id }} is {{ status }}. We'll email you again when it ships.</p>
<table>
{% for line in lines %}<tr><td>{{ line.label }}</td><td>{{ line.quantity }} &times; {{ line.unit_price }}</td><td>{{ line.line_total }}</td></tr>
{% endfor %}</table>
<p>Subtotal: {{ subtotal }}</p>
{% if has_discount %}<p>Discount ({{ coupon_code }}): -{{ discount }}</p>
{% endif %}<p><strong>Total: {{ total }}</strong></p>
<p>Paid with {{ payment_method }}. Shipping to {{ ship_to }}.</p>"#
)]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    order_id: String,
    status: &'a str,
    lines: &'a [EmailLine],
    subtotal: Money,
    has_discount: bool,
    coupon_code: &'a str,
    discount: Money,
    total: Money,
    payment_method: &'a str,
    ship_to: String,
}

#[derive(Template)]
#[template(
    ext = "txt",
    source = "Thanks for your order, {{ name }}!

Order #{{ order_id }} is {{ status }}.
{% for line in lines %}
- {{ line.label }}: {{ line.quantity }} x {{ line.unit_price }} = {{ line.line_total }}{% endfor %}

Subtotal: {{ subtotal }}
{% if has_discount %}Discount ({{ coupon_code }}): -{{ discount }}
{% endif %}Total: {{ total }}

Paid with {{ payment_method }}. Shipping to {{ ship_to }}."
)]
struct OrderConfirmationText<'a> {
    name: &'a str,
    order_id: String,
    status: &'a str,
    lines: &'a [EmailLine],
    subtotal: Money,
    has_discount: bool,
    coupon_code: &'a str,
    discount: Money,
    total: Money,
    payment_method: &'a str,
    ship_to: String,
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<p>New order #{{ order_id }} from {{ customer }} ({{ contact }}).</p>
<ul>
{% for line in lines %}<li>{{ line.quantity }} &times; {{ line.label }}</li>
{% endfor %}</ul>
<p>Total: {{ total }} via {{ payment_method }}.</p>"#
)]
struct AdminNotificationHtml<'a> {
    order_id: String,
    customer: &'a str,
    contact: &'a str,
    lines: &'a [EmailLine],
    total: Money,
    payment_method: &'a str,
}

#[derive(Template)]
#[template(
    ext = "txt",
    source = "New order #{{ order_id }} from {{ customer }} ({{ contact }}).
{% for line in lines %}
- {{ line.quantity }} x {{ line.label }}{% endfor %}

Total: {{ total }} via {{ payment_method }}."
)]
struct AdminNotificationText<'a> {
    order_id: String,
    customer: &'a str,
    contact: &'a str,
    lines: &'a [EmailLine],
    total: Money,
    payment_method: &'a str,
}

/// How many messages the mock outbox keeps before dropping the oldest.
const MOCK_OUTBOX_CAPACITY: usize = 50;

#[derive(Clone)]
enum Transport {
    Http {
        client: reqwest::Client,
        send_url: String,
        api_key: SecretString,
    },
    Mock {
        outbox: Arc<Mutex<VecDeque<OutgoingEmail>>>,
    },
}

impl Transport {
    fn mock() -> Self {
        Self::Mock {
            outbox: Arc::new(Mutex::new(VecDeque::with_capacity(MOCK_OUTBOX_CAPACITY))),
        }
    }
}

/// Email service for order confirmations and admin notifications.
#[derive(Clone)]
pub struct EmailService {
    transport: Transport,
    from: Email,
    admin_notification: Option<Email>,
}

impl EmailService {
    /// Create the service. Mock mode when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let transport = match &config.api_key {
            Some(api_key) => Transport::Http {
                client: reqwest::Client::builder()
                    .timeout(std::time::Duration::from_secs(10))
                    .build()?,
                send_url: format!("{}/send", config.api_url.as_str().trim_end_matches('/')),
                api_key: api_key.clone(),
            },
            None => {
                tracing::warn!("EMAIL_API_KEY not set, emails will only be logged");
                Transport::mock()
            }
        };

        Ok(Self {
            transport,
            from: config.from.clone(),
            admin_notification: config.admin_notification.clone(),
        })
    }

    /// A mock-mode service with the given admin address.
    #[must_use]
    pub fn mock(admin_notification: Option<Email>) -> Self {
        let config = EmailConfig {
            admin_notification,
            ..EmailConfig::mock()
        };
        Self {
            transport: Transport::mock(),
            from: config.from,
            admin_notification: config.admin_notification,
        }
    }

    /// Whether messages are only recorded locally.
    #[must_use]
    pub const fn is_mock(&self) -> bool {
        matches!(self.transport, Transport::Mock { .. })
    }

    /// The configured admin notification address.
    #[must_use]
    pub const fn admin_notification(&self) -> Option<&Email> {
        self.admin_notification.as_ref()
    }

    /// The most recent messages recorded in mock mode, oldest first. Empty in
    /// HTTP mode.
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        match &self.transport {
            Transport::Mock { outbox } => outbox.lock().await.iter().cloned().collect(),
            Transport::Http { .. } => Vec::new(),
        }
    }

    /// Send the customer's order confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or delivery fails.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn send_order_confirmation(&self, to: &Email, order: &Order) -> Result<(), EmailError> {
        let lines = email_lines(order);
        let address = &order.shipping_address;
        let ship_to = format!("{}, {} {}", address.line1, address.city, address.country);
        let status = order.status.as_str();
        let coupon_code = order.coupon_code.as_deref().unwrap_or_default();
        let has_discount = !order.discount_amount.is_zero();

        let html = OrderConfirmationHtml {
            name: &address.name,
            order_id: order.id.to_string(),
            status,
            lines: &lines,
            subtotal: order.subtotal,
            has_discount,
            coupon_code,
            discount: order.discount_amount,
            total: order.total_amount,
            payment_method: &order.payment_method,
            ship_to: ship_to.clone(),
        }
        .render()?;
        let text = OrderConfirmationText {
            name: &address.name,
            order_id: order.id.to_string(),
            status,
            lines: &lines,
            subtotal: order.subtotal,
            has_discount,
            coupon_code,
            discount: order.discount_amount,
            total: order.total_amount,
            payment_method: &order.payment_method,
            ship_to,
        }
        .render()?;

        self.deliver(OutgoingEmail {
            from: self.from.to_string(),
            to: to.to_string(),
            subject: format!("Your Marigold order #{}", order.id),
            html,
            text,
        })
        .await
    }

    /// Tell the shop about a new order.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or delivery fails.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn send_admin_notification(&self, to: &Email, order: &Order) -> Result<(), EmailError> {
        let lines = email_lines(order);
        let customer = order.shipping_address.name.as_str();
        let contact = order.shipping_address.email.as_str();

        let html = AdminNotificationHtml {
            order_id: order.id.to_string(),
            customer,
            contact,
            lines: &lines,
            total: order.total_amount,
            payment_method: &order.payment_method,
        }
        .render()?;
        let text = AdminNotificationText {
            order_id: order.id.to_string(),
            customer,
            contact,
            lines: &lines,
            total: order.total_amount,
            payment_method: &order.payment_method,
        }
        .render()?;

        self.deliver(OutgoingEmail {
            from: self.from.to_string(),
            to: to.to_string(),
            subject: format!("New order #{} ({})", order.id, order.total_amount),
            html,
            text,
        })
        .await
    }

    async fn deliver(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        match &self.transport {
            Transport::Http {
                client,
                send_url,
                api_key,
            } => {
                let response = client
                    .post(send_url)
                    .bearer_auth(api_key.expose_secret())
                    .json(&email)
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(EmailError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }
                tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
            }
            Transport::Mock { outbox } => {
                tracing::info!(to = %email.to, subject = %email.subject, "Mock email recorded");
                let mut outbox = outbox.lock().await;
                if outbox.len() == MOCK_OUTBOX_CAPACITY {
                    outbox.pop_front();
                }
                outbox.push_back(email);
            }
        }
        Ok(())
    }
}
