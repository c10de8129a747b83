mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use catalog::application::catalog::{CatalogError, CatalogService, SearchParams, SortParams};
use catalog::application::pagination::PageRequest;
use catalog::application::repos::{CreateProductParams, ProductsWriteRepo};
use catalog::domain::types::UserRef;
use catalog::infra::memory::MemoryProductStore;

use common::{
    FailingCache, LISTING_TTL, UnavailableStore, fields, harness, seed, service_with_cache,
};

fn page(page: u32, limit: u32) -> PageRequest {
    PageRequest::from_raw(page, limit).expect("positive page request")
}

fn ids(products: &[catalog::domain::entities::ProductRecord]) -> Vec<i64> {
    products.iter().map(|product| product.id).collect()
}

#[tokio::test]
async fn likes_count_tracks_liked_by_through_like_sequences() {
    let h = harness();
    let product = h
        .service
        .create(fields("Headphones", 99.0, "Audio"))
        .await
        .expect("create");
    assert_eq!(product.likes_count, 0);
    assert_eq!(product.liked_by.as_ref().map(|set| set.len()), Some(0));

    for user in [1, 2, 3] {
        let liked = h.service.like(product.id, user).await.expect("like");
        assert_eq!(
            Some(liked.likes_count as usize),
            liked.liked_by.as_ref().map(|set| set.len())
        );
    }
    let after_unlike = h.service.unlike(product.id, 2).await.expect("unlike");
    assert_eq!(after_unlike.likes_count, 2);

    let reloaded = h.service.get(product.id).await.expect("get");
    let likers: Vec<_> = reloaded
        .liked_by
        .expect("point read loads likers")
        .into_iter()
        .collect();
    assert_eq!(likers, vec![UserRef::new(1), UserRef::new(3)]);
    assert_eq!(reloaded.likes_count, 2);
}

#[tokio::test]
async fn like_unlike_scenario_on_seventh_product() {
    let h = harness();
    let products = seed(&h.service, 7).await;
    let product_id = products[6].id;
    assert_eq!(product_id, 7);

    let liked = h.service.like(7, 3).await.expect("first like");
    assert_eq!(liked.likes_count, 1);
    assert!(liked.has_liked(3));

    let again = h.service.like(7, 3).await;
    assert!(matches!(
        again,
        Err(CatalogError::AlreadyLiked {
            product_id: 7,
            user_id: 3
        })
    ));
    let unchanged = h.service.get(7).await.expect("get");
    assert_eq!(unchanged.likes_count, 1);

    let unliked = h.service.unlike(7, 3).await.expect("unlike");
    assert_eq!(unliked.likes_count, 0);
    assert!(unliked.liked_by.expect("likers loaded").is_empty());
}

#[tokio::test]
async fn unlike_of_non_member_returns_product_unchanged() {
    let h = harness();
    let product = h
        .service
        .create(fields("Lamp", 20.0, "Home"))
        .await
        .expect("create");
    h.service.like(product.id, 1).await.expect("like");
    let before = h.service.get(product.id).await.expect("get");
    let deletes_before = h.cache.deletes();

    let result = h.service.unlike(product.id, 42).await.expect("unlike");

    assert_eq!(result, before);
    assert_eq!(h.cache.deletes(), deletes_before, "no-op must not invalidate");
}

#[tokio::test]
async fn unlike_after_removal_keeps_count_at_zero() {
    let h = harness();
    let product = h
        .service
        .create(fields("Mug", 5.0, "Kitchen"))
        .await
        .expect("create");
    h.service.like(product.id, 8).await.expect("like");

    for _ in 0..3 {
        let result = h.service.unlike(product.id, 8).await.expect("unlike");
        assert_eq!(result.likes_count, 0);
    }
}

#[tokio::test]
async fn concurrent_likes_from_distinct_users_are_all_counted() {
    let h = harness();
    let product = h
        .service
        .create(fields("Keyboard", 120.0, "Computers"))
        .await
        .expect("create");

    let product_id = product.id;
    let mut handles = Vec::new();
    for user in 1..=20 {
        let service = h.service.clone();
        handles.push(tokio::spawn(
            async move { service.like(product_id, user).await },
        ));
    }
    for handle in handles {
        handle.await.expect("task joins").expect("like succeeds");
    }

    let reloaded = h.service.get(product.id).await.expect("get");
    assert_eq!(reloaded.likes_count, 20);
    assert_eq!(reloaded.liked_by.map(|set| set.len()), Some(20));
}

#[tokio::test]
async fn invalid_and_missing_ids_are_reported() {
    let h = harness();

    assert!(matches!(
        h.service.get(0).await,
        Err(CatalogError::InvalidIdentifier(_))
    ));
    assert!(matches!(
        h.service.like(-4, 1).await,
        Err(CatalogError::InvalidIdentifier(_))
    ));
    assert!(matches!(
        h.service.get(404).await,
        Err(CatalogError::NotFound { id: 404 })
    ));
    assert!(matches!(
        h.service.like(404, 1).await,
        Err(CatalogError::NotFound { id: 404 })
    ));
    assert!(matches!(
        h.service.unlike(404, 1).await,
        Err(CatalogError::NotFound { id: 404 })
    ));
    assert!(matches!(
        h.service
            .update(404, fields("Ghost", 1.0, "None"))
            .await,
        Err(CatalogError::NotFound { id: 404 })
    ));
    assert!(matches!(
        h.service.remove(404).await,
        Err(CatalogError::NotFound { id: 404 })
    ));
}

#[tokio::test]
async fn create_rejects_invalid_price() {
    let h = harness();
    let result = h.service.create(fields("Broken", -1.0, "None")).await;
    assert!(matches!(result, Err(CatalogError::Domain(_))));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn listing_pages_partition_products_newest_first() {
    let h = harness();
    let created = seed(&h.service, 15).await;

    let first = h.service.list(page(1, 10)).await.expect("page 1");
    let second = h.service.list(page(2, 10)).await.expect("page 2");

    assert_eq!(first.total, 15);
    assert_eq!(second.total, 15);
    assert_eq!((first.page, first.limit), (1, 10));
    assert_eq!(first.items.len(), 10);
    assert_eq!(second.items.len(), 5);

    let first_ids: HashSet<_> = ids(&first.items).into_iter().collect();
    let second_ids: HashSet<_> = ids(&second.items).into_iter().collect();
    assert!(first_ids.is_disjoint(&second_ids));
    assert_eq!(first_ids.len() + second_ids.len(), created.len());

    let mut all = ids(&first.items);
    all.extend(ids(&second.items));
    let mut expected = ids(&created);
    expected.reverse();
    assert_eq!(all, expected);

    assert!(first.items.iter().all(|p| p.liked_by.is_none()));
}

#[tokio::test]
async fn listing_is_served_from_cache_until_invalidated() {
    let h = harness();
    seed(&h.service, 2).await;

    let cold = h.service.list(page(1, 10)).await.expect("cold list");
    assert_eq!(cold.total, 2);

    // Writes that bypass the service are invisible to cached pages.
    h.store
        .create_product(CreateProductParams {
            fields: fields("Direct", 1.0, "General"),
        })
        .await
        .expect("direct create");
    let warm = h.service.list(page(1, 10)).await.expect("warm list");
    assert_eq!(warm, cold);

    h.service
        .create(fields("Through service", 1.0, "General"))
        .await
        .expect("create");
    let refreshed = h.service.list(page(1, 10)).await.expect("refreshed list");
    assert_eq!(refreshed.total, 4);
}

#[tokio::test]
async fn create_is_reflected_in_listing_total() {
    let h = harness();
    let before = h.service.list(page(1, 5)).await.expect("list");
    assert_eq!(before.total, 0);

    h.service
        .create(fields("New", 3.0, "General"))
        .await
        .expect("create");

    let after = h.service.list(page(1, 5)).await.expect("list");
    assert_eq!(after.total, before.total + 1);
}

#[tokio::test]
async fn update_and_remove_refresh_listings() {
    let h = harness();
    let created = seed(&h.service, 3).await;
    let target = created[2].id;

    h.service.list(page(1, 10)).await.expect("prime cache");

    let updated = h
        .service
        .update(target, fields("Renamed", 42.0, "General"))
        .await
        .expect("update");
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.id, target);

    let listed = h.service.list(page(1, 10)).await.expect("list");
    let item = listed
        .items
        .iter()
        .find(|p| p.id == target)
        .expect("updated product listed");
    assert_eq!(item.name, "Renamed");
    assert_eq!(item.price, 42.0);

    h.service.remove(target).await.expect("remove");
    let listed = h.service.list(page(1, 10)).await.expect("list");
    assert_eq!(listed.total, 2);
    assert!(listed.items.iter().all(|p| p.id != target));
    assert!(matches!(
        h.service.get(target).await,
        Err(CatalogError::NotFound { .. })
    ));
}

#[tokio::test]
async fn like_refreshes_listed_like_counts() {
    let h = harness();
    let product = h
        .service
        .create(fields("Chair", 80.0, "Home"))
        .await
        .expect("create");
    h.service.list(page(1, 10)).await.expect("prime cache");

    h.service.like(product.id, 5).await.expect("like");
    let listed = h.service.list(page(1, 10)).await.expect("list");
    assert_eq!(listed.items[0].likes_count, 1);

    h.service.unlike(product.id, 5).await.expect("unlike");
    let listed = h.service.list(page(1, 10)).await.expect("list");
    assert_eq!(listed.items[0].likes_count, 0);
}

#[tokio::test]
async fn update_keeps_likes() {
    let h = harness();
    let product = h
        .service
        .create(fields("Desk", 150.0, "Home"))
        .await
        .expect("create");
    h.service.like(product.id, 9).await.expect("like");

    let updated = h
        .service
        .update(product.id, fields("Standing desk", 300.0, "Home"))
        .await
        .expect("update");
    assert_eq!(updated.likes_count, 1);
    assert!(updated.has_liked(9));
}

#[tokio::test(start_paused = true)]
async fn expired_listing_falls_back_to_store() {
    let h = harness();
    seed(&h.service, 1).await;
    let cached = h.service.list(page(1, 10)).await.expect("list");
    assert_eq!(cached.total, 1);

    h.store
        .create_product(CreateProductParams {
            fields: fields("Direct", 1.0, "General"),
        })
        .await
        .expect("direct create");

    tokio::time::advance(LISTING_TTL - Duration::from_secs(1)).await;
    assert_eq!(h.service.list(page(1, 10)).await.expect("list").total, 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(h.service.list(page(1, 10)).await.expect("list").total, 2);
}

#[tokio::test]
async fn failing_cache_degrades_to_store() {
    let store = Arc::new(MemoryProductStore::new());
    let service = service_with_cache(store.clone(), Arc::new(FailingCache));

    let product = service
        .create(fields("Speaker", 60.0, "Audio"))
        .await
        .expect("create despite cache");
    let liked = service.like(product.id, 1).await.expect("like despite cache");
    assert_eq!(liked.likes_count, 1);

    let listed = service.list(page(1, 10)).await.expect("list despite cache");
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].likes_count, 1);
}

#[tokio::test]
async fn store_failures_surface_as_unavailable() {
    let store = Arc::new(UnavailableStore);
    let service = CatalogService::new(
        store.clone(),
        store,
        Arc::new(FailingCache),
        LISTING_TTL,
    );

    assert!(matches!(
        service.list(page(1, 10)).await,
        Err(CatalogError::StoreUnavailable(_))
    ));
    assert!(matches!(
        service.get(1).await,
        Err(CatalogError::StoreUnavailable(_))
    ));
    assert!(matches!(
        service
            .search(&SearchParams::default(), &SortParams::default())
            .await,
        Err(CatalogError::StoreUnavailable(_))
    ));
    assert!(matches!(
        service.create(fields("x", 1.0, "y")).await,
        Err(CatalogError::StoreUnavailable(_))
    ));
}

async fn search_fixture() -> (common::Harness, [i64; 3]) {
    let h = harness();
    let a = h
        .service
        .create(fields("Alpha", 50.0, "X"))
        .await
        .expect("create A");
    let b = h
        .service
        .create(fields("Beta", 150.0, "X"))
        .await
        .expect("create B");
    let c = h
        .service
        .create(fields("Gamma", 150.0, "Y"))
        .await
        .expect("create C");
    (h, [a.id, b.id, c.id])
}

fn sorted(mut values: Vec<i64>) -> Vec<i64> {
    values.sort_unstable();
    values
}

#[tokio::test]
async fn search_combines_present_filters_conjunctively() {
    let (h, [a, b, c]) = search_fixture().await;
    let sort = SortParams::default();

    let by_category = SearchParams {
        category: Some("X".to_string()),
        ..Default::default()
    };
    let found = h.service.search(&by_category, &sort).await.expect("search");
    assert_eq!(sorted(ids(&found)), vec![a, b]);

    let by_price = SearchParams {
        min_price: Some("100".to_string()),
        ..Default::default()
    };
    let found = h.service.search(&by_price, &sort).await.expect("search");
    assert_eq!(sorted(ids(&found)), vec![b, c]);

    let both = SearchParams {
        category: Some("X".to_string()),
        min_price: Some("100".to_string()),
        ..Default::default()
    };
    let found = h.service.search(&both, &sort).await.expect("search");
    assert_eq!(ids(&found), vec![b]);

    let everything = h
        .service
        .search(&SearchParams::default(), &sort)
        .await
        .expect("search");
    assert_eq!(ids(&everything), vec![c, b, a]);
    assert!(everything.iter().all(|p| p.liked_by.is_none()));
}

#[tokio::test]
async fn search_matches_name_substrings_and_like_threshold() {
    let (h, [a, b, _c]) = search_fixture().await;
    h.service.like(b, 1).await.expect("like");
    h.service.like(b, 2).await.expect("like");
    h.service.like(a, 1).await.expect("like");
    let sort = SortParams::default();

    let by_name = SearchParams {
        q: Some("eta".to_string()),
        ..Default::default()
    };
    let found = h.service.search(&by_name, &sort).await.expect("search");
    assert_eq!(ids(&found), vec![b]);

    let popular = SearchParams {
        min_likes: Some("2".to_string()),
        ..Default::default()
    };
    let found = h.service.search(&popular, &sort).await.expect("search");
    assert_eq!(ids(&found), vec![b]);
}

#[tokio::test]
async fn search_filters_by_subcategory_and_inclusive_price_ceiling() {
    let h = harness();
    let mut over_ear = fields("Studio", 200.0, "Audio");
    over_ear.subcategory = "Headphones".to_string();
    let mut in_ear = fields("Buds", 80.0, "Audio");
    in_ear.subcategory = "Earphones".to_string();
    let mut pricey_in_ear = fields("Buds Pro", 250.0, "Audio");
    pricey_in_ear.subcategory = "Earphones".to_string();

    let over_ear = h.service.create(over_ear).await.expect("create");
    let in_ear = h.service.create(in_ear).await.expect("create");
    let pricey_in_ear = h.service.create(pricey_in_ear).await.expect("create");
    let sort = SortParams::default();

    let by_subcategory = SearchParams {
        subcategory: Some("Earphones".to_string()),
        ..Default::default()
    };
    let found = h
        .service
        .search(&by_subcategory, &sort)
        .await
        .expect("search");
    assert_eq!(sorted(ids(&found)), vec![in_ear.id, pricey_in_ear.id]);

    let partial = SearchParams {
        subcategory: Some("Ear".to_string()),
        ..Default::default()
    };
    let found = h.service.search(&partial, &sort).await.expect("search");
    assert!(found.is_empty(), "subcategory must match exactly");

    let ceiling = SearchParams {
        max_price: Some("200".to_string()),
        ..Default::default()
    };
    let found = h.service.search(&ceiling, &sort).await.expect("search");
    assert_eq!(sorted(ids(&found)), vec![over_ear.id, in_ear.id]);

    let window = SearchParams {
        min_price: Some("80".to_string()),
        max_price: Some("80".to_string()),
        subcategory: Some("Earphones".to_string()),
        ..Default::default()
    };
    let found = h.service.search(&window, &sort).await.expect("search");
    assert_eq!(ids(&found), vec![in_ear.id]);
}

#[tokio::test]
async fn search_ignores_malformed_numeric_filters() {
    let (h, _) = search_fixture().await;
    let params = SearchParams {
        min_price: Some("cheap".to_string()),
        max_price: Some("-10".to_string()),
        min_likes: Some(String::new()),
        ..Default::default()
    };

    let found = h
        .service
        .search(&params, &SortParams::default())
        .await
        .expect("search");
    assert_eq!(found.len(), 3);
}

#[tokio::test]
async fn search_sorts_by_whitelisted_field_with_id_tiebreak() {
    let (h, [a, b, c]) = search_fixture().await;

    let ascending = SortParams {
        sort_by: Some("price".to_string()),
        order: Some("ASC".to_string()),
    };
    let found = h
        .service
        .search(&SearchParams::default(), &ascending)
        .await
        .expect("search");
    assert_eq!(ids(&found), vec![a, b, c]);

    let descending = SortParams {
        sort_by: Some("price".to_string()),
        order: Some("desc".to_string()),
    };
    let found = h
        .service
        .search(&SearchParams::default(), &descending)
        .await
        .expect("search");
    assert_eq!(ids(&found), vec![c, b, a]);
}

#[tokio::test]
async fn search_rejects_unknown_sort_field() {
    let (h, _) = search_fixture().await;
    let sort = SortParams {
        sort_by: Some("password".to_string()),
        order: None,
    };

    let result = h.service.search(&SearchParams::default(), &sort).await;
    assert!(matches!(result, Err(CatalogError::InvalidSort(_))));
}
