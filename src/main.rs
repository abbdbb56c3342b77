use anyhow::Context;
use rust_decimal_macros::dec;
use tracing::{error, info, instrument, warn, Instrument};

use agri_cart::domain::{Product, Receipt, Role, UserProfile};
use agri_cart::services::{LoggingOrderDesk, OrderPlacement};
use agri_cart::{setup_tracing, CartClient, CheckoutError, EngineConfig, Marketplace, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env().context("loading configuration")?;
    setup_tracing(&config.log_level);

    info!("Starting marketplace demo");

    let market = Marketplace::start(&config);
    market
        .catalog
        .replace_all(vec![
            Product::new("rice", "Basmati Rice", dec!(60), dec!(10)).with_owner("farmer-1"),
            Product::new("okra", "Okra", dec!(40), dec!(4)).with_owner("farmer-2"),
            Product::new("turmeric", "Turmeric", dec!(150), dec!(2.5)).with_owner("farmer-1"),
        ])
        .await?;

    let profile = UserProfile::new("consumer-1", "Meena", Role::Consumer);
    let session = Session::login(profile, &market.catalog, &config).await?;

    let span = tracing::info_span!("shopping");
    async {
        session.cart.add_to_cart("rice".to_string()).await?;
        session.cart.update_quantity("rice".to_string(), dec!(3)).await?;
        session.cart.add_to_cart("okra".to_string()).await?;
        session.cart.update_quantity("okra".to_string(), dec!(4)).await?;
        if let Err(e) = session.cart.update_quantity("okra".to_string(), dec!(5)).await {
            warn!(error = %e, "Update rejected");
        }
        anyhow::Ok(())
    }
    .instrument(span)
    .await?;

    // Another buyer takes most of the okra.
    let revision = market
        .catalog
        .upsert(Product::new("okra", "Okra", dec!(40), dec!(1)).with_owner("farmer-2"))
        .await?;
    for _ in 0..50 {
        if session.cart.get_view().await?.catalog_revision >= revision {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let view = session.cart.get_view().await?;
    info!(view = %serde_json::to_string(&view)?, "Cart after catalog update");

    let receipt = checkout_or_clamp(&session.cart).await;

    match receipt {
        Ok(receipt) => {
            info!(total = %receipt.total, lines = receipt.lines.len(), "Checkout complete");
            let order_id = LoggingOrderDesk.place(receipt).await?;
            info!(order_id = %order_id, "Order handed off");
        }
        Err(e) => error!(error = %e, "Checkout failed"),
    }

    session.logout().await?;
    market.shutdown().await;

    info!("Demo completed");
    Ok(())
}

/// Tries to check out; on a conflict, trims the cart to what is listed and
/// tries once more.
#[instrument(name = "checkout", skip(cart))]
async fn checkout_or_clamp(cart: &CartClient) -> anyhow::Result<Receipt> {
    match cart.checkout().await {
        Err(CheckoutError::Conflict(ids)) => {
            warn!(products = ?ids, "Checkout blocked; clamping cart to availability");
            cart.clamp_to_availability().await?;
            Ok(cart.checkout().await?)
        }
        other => Ok(other?),
    }
}
