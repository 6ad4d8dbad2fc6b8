use bakery_cart::models::{CartItem, Product, ProductCategory, normalize_product_id};
use bakery_cart::store::GuestCartStore;
use bakery_cart::store::guest::JsonGuestStore;
use uuid::Uuid;

fn temp_store() -> JsonGuestStore {
    let path = std::env::temp_dir().join(format!("bakery-cart-test-{}.json", Uuid::new_v4()));
    JsonGuestStore::new(path)
}

fn sample_items() -> Vec<CartItem> {
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: "Pão Francês".into(),
        description: Some("Crusty breakfast roll".into()),
        image_url: None,
        price_cents: 120,
        category: ProductCategory::Regular,
        order_quantity: None,
    };
    let id = normalize_product_id(&product.id).unwrap();
    vec![CartItem::from_product(&product, id, 3, None)]
}

#[tokio::test]
async fn missing_file_reads_as_absent() -> anyhow::Result<()> {
    let store = temp_store();
    assert_eq!(store.read().await?, None);
    Ok(())
}

#[tokio::test]
async fn written_cart_reads_back_identically() -> anyhow::Result<()> {
    let store = temp_store();
    let items = sample_items();

    store.write(&items).await?;
    assert_eq!(store.read().await?, Some(items.clone()));

    // Overwriting replaces, it does not append.
    store.write(&items).await?;
    assert_eq!(store.read().await?.map(|i| i.len()), Some(1));

    store.clear().await?;
    Ok(())
}

#[tokio::test]
async fn clear_removes_the_file_and_is_idempotent() -> anyhow::Result<()> {
    let store = temp_store();
    store.write(&sample_items()).await?;

    store.clear().await?;
    assert_eq!(store.read().await?, None);

    // Clearing an absent cart is fine.
    store.clear().await?;
    Ok(())
}
