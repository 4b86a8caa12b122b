//! Checkout wizard and payment route handlers.
//!
//! The wizard state is kept in the session next to the cart. Payment
//! endpoints set the in-flight guard before charging and clear it again on
//! failure, so a second click while the first is running is refused.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use marigold_core::cart::Cart;
use marigold_core::checkout::{Checkout, CheckoutError, CheckoutStep};
use marigold_core::coupon::normalize_code;
use marigold_core::order::{Order, ShippingAddress};
use marigold_core::payment::{CardDetails, HostedCheckout, PaymentMethod};
use marigold_core::OrderId;

use crate::error::Result;
use crate::middleware::OptionalUser;
use crate::middleware::session::{load_or_default, save};
use crate::models::{CurrentUser, session_keys};
use crate::routes::cart::load_cart;
use crate::services::checkout::{CheckoutService, PlacedOrder, Placement, Quote};
use crate::state::AppState;

/// Wizard state as returned to the client.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub step_number: u8,
    pub shipping: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub coupon_code: Option<String>,
    pub form_submitted: bool,
    pub order_complete: bool,
    pub order_id: Option<OrderId>,
}

impl From<&Checkout> for CheckoutView {
    fn from(checkout: &Checkout) -> Self {
        Self {
            step: checkout.step(),
            step_number: checkout.step().number(),
            shipping: checkout.shipping().cloned(),
            payment_method: checkout.payment_method(),
            coupon_code: checkout.coupon_code().map(str::to_owned),
            form_submitted: checkout.form_submitted(),
            order_complete: checkout.order_complete(),
            order_id: checkout.order_id(),
        }
    }
}

/// Coupon body; `null` or a blank code removes the coupon.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: Option<String>,
}

/// Hosted approval callback body.
#[derive(Debug, Deserialize)]
pub struct HostedApproval {
    pub reference: String,
}

/// A placed order.
#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub order: Order,
    /// The submission key had already produced this order.
    pub replayed: bool,
}

impl From<PlacedOrder> for OrderPlaced {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            order: placed.order,
            replayed: placed.replayed,
        }
    }
}

async fn load_checkout(session: &Session) -> Result<Checkout> {
    Ok(load_or_default(session, session_keys::CHECKOUT).await?)
}

async fn save_checkout(session: &Session, checkout: &Checkout) -> Result<Json<CheckoutView>> {
    save(session, session_keys::CHECKOUT, checkout).await?;
    Ok(Json(CheckoutView::from(checkout)))
}

/// Current wizard state.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CheckoutView>> {
    let checkout = load_checkout(&session).await?;
    Ok(Json(CheckoutView::from(&checkout)))
}

/// Cart → Shipping. A wizard that already produced an order starts over.
#[instrument(skip(session))]
pub async fn start(session: Session) -> Result<Json<CheckoutView>> {
    let cart = load_cart(&session).await?;
    let mut checkout = load_checkout(&session).await?;
    if checkout.order_complete() {
        checkout = Checkout::new();
        session
            .remove::<HostedCheckout>(session_keys::HOSTED_CHECKOUT)
            .await?;
    }

    checkout.proceed_to_shipping(&cart)?;
    save_checkout(&session, &checkout).await
}

/// Shipping → Payment.
#[instrument(skip(session, address))]
pub async fn shipping(
    session: Session,
    Json(address): Json<ShippingAddress>,
) -> Result<Json<CheckoutView>> {
    let mut checkout = load_checkout(&session).await?;
    checkout.submit_shipping(address)?;
    save_checkout(&session, &checkout).await
}

/// Step back one screen.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Json<CheckoutView>> {
    let mut checkout = load_checkout(&session).await?;
    checkout.back()?;
    save_checkout(&session, &checkout).await
}

/// Apply or remove a coupon and return the new quote.
#[instrument(skip(state, session))]
pub async fn coupon(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CouponForm>,
) -> Result<Json<Quote>> {
    let cart = load_cart(&session).await?;
    let mut checkout = load_checkout(&session).await?;
    let service = CheckoutService::new(state.pool(), state.email());

    let code = form
        .code
        .as_deref()
        .map(normalize_code)
        .filter(|c| !c.is_empty());
    if let Some(code) = &code {
        service.apply_coupon(code, cart.total()).await?;
    }

    checkout.set_coupon(code)?;
    save(&session, session_keys::CHECKOUT, &checkout).await?;

    Ok(Json(service.quote(&cart, checkout.coupon_code()).await?))
}

/// Price the cart with the wizard's coupon.
#[instrument(skip(state, session))]
pub async fn quote(State(state): State<AppState>, session: Session) -> Result<Json<Quote>> {
    let cart = load_cart(&session).await?;
    let checkout = load_checkout(&session).await?;
    let quote = CheckoutService::new(state.pool(), state.email())
        .quote(&cart, checkout.coupon_code())
        .await?;
    Ok(Json(quote))
}

/// Pay with the demo card form.
#[instrument(skip(state, session, user, card))]
pub async fn pay_card(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Json(card): Json<CardDetails>,
) -> Result<Json<OrderPlaced>> {
    submit(&state, &session, user.as_ref(), Payment::Card(&card)).await
}

/// Hosted checkout *create* callback: open a checkout for the current total.
#[instrument(skip(state, session))]
pub async fn hosted_create(
    State(state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<HostedCheckout>)> {
    let cart = load_cart(&session).await?;
    let checkout = load_checkout(&session).await?;
    if checkout.order_complete() {
        return Err(CheckoutError::AlreadyComplete.into());
    }
    if checkout.step() != CheckoutStep::Payment {
        return Err(CheckoutError::OutOfOrder {
            from: checkout.step(),
            to: CheckoutStep::Confirmation,
        }
        .into());
    }
    if cart.is_checkout_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    let quote = CheckoutService::new(state.pool(), state.email())
        .quote(&cart, checkout.coupon_code())
        .await?;
    let hosted = state.payments().create_hosted(quote.total);
    save(&session, session_keys::HOSTED_CHECKOUT, &hosted).await?;

    tracing::info!(reference = %hosted.reference, amount = %hosted.amount, "Hosted checkout created");
    Ok((StatusCode::CREATED, Json(hosted)))
}

/// Hosted checkout *approve* callback: place the order.
#[instrument(skip(state, session, user))]
pub async fn hosted_approve(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Json(approval): Json<HostedApproval>,
) -> Result<Json<OrderPlaced>> {
    submit(
        &state,
        &session,
        user.as_ref(),
        Payment::Hosted {
            reference: &approval.reference,
        },
    )
    .await
}

/// Cash on delivery.
#[instrument(skip(state, session, user))]
pub async fn pay_cod(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Json<OrderPlaced>> {
    submit(&state, &session, user.as_ref(), Payment::Cod).await
}

enum Payment<'a> {
    Card(&'a CardDetails),
    Hosted { reference: &'a str },
    Cod,
}

impl Payment<'_> {
    const fn method(&self) -> PaymentMethod {
        match self {
            Self::Card(_) => PaymentMethod::Card,
            Self::Hosted { .. } => PaymentMethod::Hosted,
            Self::Cod => PaymentMethod::Cod,
        }
    }
}

/// Guard, charge, place, then settle the wizard and cart.
async fn submit(
    state: &AppState,
    session: &Session,
    user: Option<&CurrentUser>,
    payment: Payment<'_>,
) -> Result<Json<OrderPlaced>> {
    let cart = load_cart(session).await?;
    let mut checkout = load_checkout(session).await?;

    checkout.begin_submission(&cart, payment.method())?;
    save(session, session_keys::CHECKOUT, &checkout).await?;

    match charge_and_place(state, session, user, &cart, &checkout, payment).await {
        Ok(placed) => {
            checkout.complete(placed.order.id);
            save(session, session_keys::CHECKOUT, &checkout).await?;
            save(session, session_keys::CART, &Cart::new()).await?;
            session
                .remove::<HostedCheckout>(session_keys::HOSTED_CHECKOUT)
                .await?;
            Ok(Json(OrderPlaced::from(placed)))
        }
        Err(e) => {
            checkout.fail_submission();
            save(session, session_keys::CHECKOUT, &checkout).await?;
            tracing::warn!(error = %e, "Order submission failed");
            Err(e)
        }
    }
}

async fn charge_and_place(
    state: &AppState,
    session: &Session,
    user: Option<&CurrentUser>,
    cart: &Cart,
    checkout: &Checkout,
    payment: Payment<'_>,
) -> Result<PlacedOrder> {
    let service = CheckoutService::new(state.pool(), state.email());
    let quote = service.quote(cart, checkout.coupon_code()).await?;
    let method = payment.method();

    let payment_reference = match payment {
        Payment::Card(card) => Some(state.payments().charge_card(card, quote.total).await?.reference),
        Payment::Hosted { reference } => {
            let pending: Option<HostedCheckout> =
                session.get(session_keys::HOSTED_CHECKOUT).await?;
            let receipt = state
                .payments()
                .approve_hosted(pending.as_ref(), reference, quote.total)?;
            Some(receipt.reference)
        }
        Payment::Cod => None,
    };

    let placed = service
        .place_order(Placement {
            cart,
            user_id: user.map(|u| u.id),
            shipping_address: checkout.shipping().cloned().unwrap_or_default(),
            payment_method: method.as_str(),
            payment_reference,
            coupon_code: checkout.coupon_code(),
            submission_key: checkout.submission_key(),
        })
        .await?;

    Ok(placed)
}
