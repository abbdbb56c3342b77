#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::app_system::{DeletedProductPolicy, EngineConfig, Marketplace, Session};
    use crate::cart::{CartError, CheckoutError, LineStatus};
    use crate::cart_actor::{CartService, FeedStatus};
    use crate::clients::CartClient;
    use crate::domain::{Product, Role, UserProfile};
    use crate::live_collection::{FeedError, FeedEvent, Snapshot};
    use crate::mock_framework::{accept_subscription, create_mock_collection};

    fn consumer() -> UserProfile {
        UserProfile::new("u-42", "Anita", Role::Consumer)
    }

    async fn wait_for_revision(cart: &CartClient, revision: u64) {
        for _ in 0..200 {
            if cart.get_revision().await.unwrap() >= revision {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("cart never saw catalog revision {}", revision);
    }

    async fn market_with(products: Vec<Product>) -> (Marketplace, u64) {
        let market = Marketplace::start(&EngineConfig::default());
        let revision = market.catalog.replace_all(products).await.unwrap();
        (market, revision)
    }

    #[tokio::test]
    async fn eleventh_add_is_rejected_through_the_session() {
        let (market, revision) =
            market_with(vec![Product::new("P", "Paddy seed", dec!(48), dec!(10))]).await;
        let session = Session::login(consumer(), &market.catalog, &EngineConfig::default())
            .await
            .unwrap();
        wait_for_revision(&session.cart, revision).await;

        for n in 1..=10 {
            let line = session.cart.add_to_cart("P".into()).await.unwrap();
            assert_eq!(line.quantity, Decimal::from(n));
        }
        let rejected = session.cart.add_to_cart("P".into()).await;
        assert!(matches!(rejected, Err(CartError::OverLimit { .. })));

        let view = session.cart.get_view().await.unwrap();
        assert_eq!(view.lines[0].line.quantity, dec!(10));
        assert_eq!(view.total, dec!(480));

        session.logout().await.unwrap();
        market.shutdown().await;
    }

    #[tokio::test]
    async fn reduced_stock_from_a_new_snapshot_limits_updates() {
        let (market, revision) =
            market_with(vec![Product::new("P", "Paddy seed", dec!(48), dec!(10))]).await;
        let session = Session::login(consumer(), &market.catalog, &EngineConfig::default())
            .await
            .unwrap();
        wait_for_revision(&session.cart, revision).await;

        session.cart.add_to_cart("P".into()).await.unwrap();
        session.cart.update_quantity("P".into(), dec!(4)).await.unwrap();

        let revision = market
            .catalog
            .upsert(Product::new("P", "Paddy seed", dec!(48), dec!(2)))
            .await
            .unwrap();
        wait_for_revision(&session.cart, revision).await;

        let view = session.cart.get_view().await.unwrap();
        assert_eq!(
            view.lines[0].status,
            LineStatus::Exceeds { held: dec!(4), available: dec!(2) }
        );

        let rejected = session.cart.update_quantity("P".into(), dec!(3)).await;
        assert_eq!(
            rejected,
            Err(CartError::OverLimit {
                product_id: "P".into(),
                requested: dec!(3),
                available: dec!(2),
            })
        );
        let line = session.cart.update_quantity("P".into(), dec!(2)).await.unwrap();
        assert_eq!(line.map(|l| l.quantity), Some(dec!(2)));

        session.logout().await.unwrap();
        market.shutdown().await;
    }

    #[tokio::test]
    async fn checkout_is_all_or_nothing_against_the_live_catalog() {
        let (market, revision) = market_with(vec![
            Product::new("A", "Sugarcane", dec!(5), dec!(5)),
            Product::new("B", "Cotton", dec!(60), dec!(5)),
        ])
        .await;
        let session = Session::login(consumer(), &market.catalog, &EngineConfig::default())
            .await
            .unwrap();
        wait_for_revision(&session.cart, revision).await;

        session.cart.add_to_cart("A".into()).await.unwrap();
        session.cart.update_quantity("A".into(), dec!(3)).await.unwrap();
        session.cart.add_to_cart("B".into()).await.unwrap();
        session.cart.update_quantity("B".into(), dec!(2)).await.unwrap();
        let before = session.cart.get_view().await.unwrap();

        let revision = market
            .catalog
            .upsert(Product::new("B", "Cotton", dec!(60), dec!(1)))
            .await
            .unwrap();
        wait_for_revision(&session.cart, revision).await;

        assert_eq!(
            session.cart.checkout().await,
            Err(CheckoutError::Conflict(vec!["B".to_string()]))
        );
        let after = session.cart.get_view().await.unwrap();
        assert_eq!(
            after.lines.iter().map(|l| &l.line).collect::<Vec<_>>(),
            before.lines.iter().map(|l| &l.line).collect::<Vec<_>>()
        );

        // The caller chooses to correct the cart, then commits.
        let adjustments = session.cart.clamp_to_availability().await.unwrap();
        assert_eq!(adjustments.len(), 1);
        let receipt = session.cart.checkout().await.unwrap();
        assert_eq!(receipt.total, dec!(75));
        assert!(session.cart.get_view().await.unwrap().lines.is_empty());

        session.logout().await.unwrap();
        market.shutdown().await;
    }

    #[tokio::test]
    async fn delisted_product_is_frozen_by_default() {
        let (market, revision) =
            market_with(vec![Product::new("M", "Mustard", dec!(70), dec!(3))]).await;
        let session = Session::login(consumer(), &market.catalog, &EngineConfig::default())
            .await
            .unwrap();
        wait_for_revision(&session.cart, revision).await;
        session.cart.add_to_cart("M".into()).await.unwrap();

        market.catalog.remove("M".into()).await.unwrap();
        wait_for_revision(&session.cart, revision + 1).await;

        let view = session.cart.get_view().await.unwrap();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].status, LineStatus::Unavailable);
        assert_eq!(view.total, dec!(70));
        assert_eq!(
            session.cart.add_to_cart("M".into()).await,
            Err(CartError::Unavailable("M".into()))
        );

        session.logout().await.unwrap();
        market.shutdown().await;
    }

    #[tokio::test]
    async fn delisted_product_is_evicted_when_configured() {
        let config = EngineConfig {
            deleted_product_policy: DeletedProductPolicy::Evict,
            ..EngineConfig::default()
        };
        let (market, revision) = market_with(vec![
            Product::new("M", "Mustard", dec!(70), dec!(3)),
            Product::new("S", "Sesame", dec!(110), dec!(3)),
        ])
        .await;
        let session = Session::login(consumer(), &market.catalog, &config)
            .await
            .unwrap();
        wait_for_revision(&session.cart, revision).await;
        session.cart.add_to_cart("M".into()).await.unwrap();
        session.cart.add_to_cart("S".into()).await.unwrap();

        market.catalog.remove("M".into()).await.unwrap();
        wait_for_revision(&session.cart, revision + 1).await;

        let view = session.cart.get_view().await.unwrap();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].line.product_id, "S");

        session.logout().await.unwrap();
        market.shutdown().await;
    }

    #[tokio::test]
    async fn feed_failure_degrades_but_cart_keeps_working() {
        let (market, revision) =
            market_with(vec![Product::new("C", "Coriander", dec!(20), dec!(4))]).await;
        let session = Session::login(consumer(), &market.catalog, &EngineConfig::default())
            .await
            .unwrap();
        wait_for_revision(&session.cart, revision).await;

        market
            .catalog
            .fail(FeedError::Backend("quota exceeded".into()))
            .await
            .unwrap();

        let mut status = FeedStatus::Live;
        for _ in 0..200 {
            status = session.cart.get_view().await.unwrap().feed;
            if status != FeedStatus::Live {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(
            status,
            FeedStatus::Degraded("Feed backend error: quota exceeded".to_string())
        );

        // The last snapshot still backs every check.
        session.cart.add_to_cart("C".into()).await.unwrap();
        assert_eq!(session.cart.get_total().await.unwrap(), dec!(20));

        session.logout().await.unwrap();
        market.shutdown().await;
    }

    #[tokio::test]
    async fn catalog_listing_shows_remaining_quantity() {
        let (market, revision) =
            market_with(vec![Product::new("G", "Garlic", dec!(200), dec!(2.5))]).await;
        let session = Session::login(consumer(), &market.catalog, &EngineConfig::default())
            .await
            .unwrap();
        wait_for_revision(&session.cart, revision).await;
        session.cart.add_to_cart("G".into()).await.unwrap();

        let listing = session.cart.catalog_availability().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].in_cart, dec!(1));
        assert_eq!(listing[0].remaining, dec!(1.5));

        session.logout().await.unwrap();
        market.shutdown().await;
    }

    #[tokio::test]
    async fn logout_stops_snapshot_delivery() {
        let (client, mut requests) = create_mock_collection::<Product>(10);

        let login = tokio::spawn(async move {
            Session::login(consumer(), &client, &EngineConfig::default()).await
        });
        let events = accept_subscription(&mut requests, 1)
            .await
            .expect("Expected Subscribe request");
        let session = login.await.unwrap().unwrap();
        assert_eq!(session.dashboard(), Role::Consumer.dashboard());

        let products = vec![Product::new("T", "Tamarind", dec!(90), dec!(6))];
        assert!(events.push(FeedEvent::Snapshot(Snapshot::new(1, products))));
        wait_for_revision(&session.cart, 1).await;

        session.logout().await.unwrap();
        assert!(!events.push(FeedEvent::Snapshot(Snapshot::empty())));
    }

    #[tokio::test]
    async fn snapshots_and_user_operations_are_serialized() {
        let (service, cart) = CartService::new(16, DeletedProductPolicy::Freeze);
        tokio::spawn(service.run());
        let mut sink = cart.catalog_sink();

        for (revision, quantity) in [(1u64, 5), (2, 1), (3, 3)] {
            sink(FeedEvent::Snapshot(Snapshot::new(
                revision,
                vec![Product::new("K", "Kokum", dec!(10), Decimal::from(quantity))],
            )));
        }
        wait_for_revision(&cart, 3).await;

        // Only the last snapshot (3 listed) counts.
        cart.add_to_cart("K".into()).await.unwrap();
        cart.update_quantity("K".into(), dec!(3)).await.unwrap();
        assert!(cart.add_to_cart("K".into()).await.is_err());

        cart.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn oversized_quantity_is_rejected_and_the_cart_keeps_serving() {
        let (service, cart) = CartService::new(16, DeletedProductPolicy::Freeze);
        let handle = tokio::spawn(service.run());
        let mut sink = cart.catalog_sink();
        sink(FeedEvent::Snapshot(Snapshot::new(
            1,
            vec![Product::new(
                "X",
                "Export lot",
                dec!(1000000000000000),
                dec!(1000000000000000),
            )],
        )));
        wait_for_revision(&cart, 1).await;

        cart.add_to_cart("X".into()).await.unwrap();
        let rejected = cart.update_quantity("X".into(), dec!(1000000000000000)).await;
        assert!(matches!(rejected, Err(CartError::TotalOverflow { .. })));

        assert_eq!(cart.get_total().await.unwrap(), dec!(1000000000000000));
        assert_eq!(cart.get_view().await.unwrap().lines[0].line.quantity, dec!(1));
        let receipt = cart.checkout().await.unwrap();
        assert_eq!(receipt.total, dec!(1000000000000000));

        cart.shutdown().await.unwrap();
        handle.await.unwrap();
    }
}
