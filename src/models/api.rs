//! Wire types for the marketplace REST API
//!
//! These mirror the JSON payloads the platform exchanges with its clients.
//! All entities are owned by the backend; the probe only reads the fields it
//! asserts on, so most of them are optional and unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Credentials for `POST /auth/login`
#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response from `POST /auth/login`
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// A purchasable product offered by a tipster
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub billing_type: Option<String>,
    #[serde(default)]
    pub telegram_channel_id: Option<String>,
    #[serde(default)]
    pub access_mode: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub tipster: Option<Tipster>,
}

/// Body for `POST /products`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub currency: String,
    pub billing_type: String,
    pub telegram_channel_id: String,
    pub access_mode: String,
}

impl CreateProductRequest {
    /// The fixture product every probe run creates
    pub fn fixture() -> Self {
        Self {
            title: "Probe Product".to_string(),
            description: "Created by the API probe".to_string(),
            price_cents: 3500,
            currency: "EUR".to_string(),
            billing_type: "ONE_TIME".to_string(),
            telegram_channel_id: "@probe_channel".to_string(),
            access_mode: "AUTO_JOIN".to_string(),
        }
    }
}

/// Body for `PATCH /products/{id}`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub title: String,
    pub price_cents: i64,
    pub description: String,
}

impl UpdateProductRequest {
    pub fn fixture() -> Self {
        Self {
            title: "Probe Product (updated)".to_string(),
            price_cents: 4500,
            description: "Updated by the API probe".to_string(),
        }
    }
}

/// Public tipster profile attached to checkout payloads
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tipster {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub public_name: Option<String>,
}

/// Body for `POST /checkout/session`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub product_id: String,
    pub origin_url: String,
    pub is_guest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_username: Option<String>,
}

/// Response from `POST /checkout/session`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub url: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub order_id: Option<String>,
}

/// A purchase transaction record
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_provider: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
}

/// Paid-order status marker used by the platform
pub const ORDER_STATUS_PAID: &str = "PAGADA";

/// Envelope from `GET /checkout/order/{id}` and `POST /checkout/complete-payment`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    pub order: Option<Order>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub tipster: Option<Tipster>,
}

/// Response from `POST /checkout/simulate-payment/{id}`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub success: bool,
    pub order: Option<Order>,
    #[serde(default)]
    pub telegram_notification: Option<serde_json::Value>,
}

/// Response from `GET /checkout/detect-gateway`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySelection {
    pub gateway: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Response from `GET /telegram/channel-info`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub connected: bool,
    #[serde(default)]
    pub channel: Option<serde_json::Value>,
    #[serde(default)]
    pub premium_channel_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_product_serializes_camel_case() {
        let body = CreateProductRequest::fixture();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["priceCents"], 3500);
        assert_eq!(json["billingType"], "ONE_TIME");
        assert_eq!(json["telegramChannelId"], "@probe_channel");
        assert_eq!(json["accessMode"], "AUTO_JOIN");
    }

    #[test]
    fn product_deserializes_partial_payload() {
        let json = r#"{"id":"p1","title":"Picks","priceCents":3500,"active":false}"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.id.as_deref(), Some("p1"));
        assert_eq!(product.price_cents, Some(3500));
        assert_eq!(product.active, Some(false));
        assert!(product.tipster.is_none());
    }

    #[test]
    fn checkout_session_skips_absent_optionals() {
        let body = CheckoutSessionRequest {
            product_id: "p1".to_string(),
            origin_url: "https://shop.example.com".to_string(),
            is_guest: true,
            email: Some("buyer@example.com".to_string()),
            telegram_user_id: None,
            telegram_username: None,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["productId"], "p1");
        assert_eq!(json["isGuest"], true);
        assert!(json.get("telegramUserId").is_none());
    }

    #[test]
    fn channel_info_parses_with_and_without_link() {
        let bare: ChannelInfo = serde_json::from_str(r#"{"connected":false}"#).unwrap();
        assert!(!bare.connected);
        assert!(bare.premium_channel_link.is_none());

        let linked: ChannelInfo = serde_json::from_str(
            r#"{"connected":true,"channel":{"id":-100123},"premiumChannelLink":"https://t.me/+abc"}"#,
        )
        .unwrap();
        assert!(linked.connected);
        assert_eq!(linked.premium_channel_link.as_deref(), Some("https://t.me/+abc"));
    }

    #[test]
    fn order_envelope_tolerates_missing_sections() {
        let json = r#"{"order":{"id":"o1","status":"PAGADA","amountCents":3400}}"#;
        let envelope: OrderEnvelope = serde_json::from_str(json).unwrap();

        let order = envelope.order.unwrap();
        assert_eq!(order.status.as_deref(), Some(ORDER_STATUS_PAID));
        assert!(envelope.product.is_none());
        assert!(envelope.tipster.is_none());
    }
}
