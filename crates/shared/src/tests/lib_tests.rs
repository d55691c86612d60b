use crate::{
    domain::{CollectionPage, EnabledFlag, ImageList, Product, ProductId, MAX_SECONDARY_IMAGES},
    error::ErrorCode,
    protocol::{ApiMessage, DataEnvelope, ProductListResponse},
};

#[test]
fn decodes_product_with_wire_field_names() {
    let product: Product = serde_json::from_value(serde_json::json!({
        "id": "-Nx7",
        "title": "Pen",
        "category": "stationery",
        "unit": "pcs",
        "origin_price": 50,
        "price": 35,
        "is_enabled": 1,
        "imageUrl": "https://img/main.png",
        "imagesUrl": ["https://img/a.png", "https://img/b.png"]
    }))
    .expect("decode product");

    assert_eq!(product.id, Some(ProductId::from("-Nx7")));
    assert_eq!(product.price, 35.0);
    assert_eq!(product.is_enabled, EnabledFlag::Enabled);
    assert_eq!(product.image_url, "https://img/main.png");
    assert_eq!(product.images_url.len(), 2);
    assert_eq!(product.trending, 0.0);
}

#[test]
fn create_payload_omits_id_and_keeps_integer_flag() {
    let mut product = Product::empty_template();
    product.id = Some(ProductId::from("7"));
    product.is_enabled = EnabledFlag::Disabled;

    let value = serde_json::to_value(DataEnvelope::new(product.without_id())).expect("encode");
    let data = &value["data"];
    assert!(data.get("id").is_none());
    assert_eq!(data["is_enabled"], serde_json::json!(0));
    assert_eq!(data["imagesUrl"], serde_json::json!([]));
}

#[test]
fn oversized_image_lists_are_truncated_on_decode() {
    let images: ImageList = serde_json::from_value(serde_json::json!([
        "1", "2", "3", "4", "5", "6", "7"
    ]))
    .expect("decode images");
    assert_eq!(images.len(), MAX_SECONDARY_IMAGES);
    assert_eq!(images.last(), Some("5"));
}

#[test]
fn image_list_refuses_growth_past_bound() {
    let full = ImageList::from(vec!["a".to_string(); MAX_SECONDARY_IMAGES]);
    assert!(full.is_full());
    assert!(full.with_pushed("").is_none());
    assert!(full.with_replaced(MAX_SECONDARY_IMAGES, "x").is_none());
    assert_eq!(full.without_last().len(), MAX_SECONDARY_IMAGES - 1);
}

#[test]
fn enabled_flag_coerces_radio_values() {
    assert_eq!(EnabledFlag::from_raw("1"), EnabledFlag::Enabled);
    assert_eq!(EnabledFlag::from_raw("0"), EnabledFlag::Disabled);
    assert_eq!(EnabledFlag::from_raw("on"), EnabledFlag::Enabled);
    assert_eq!(EnabledFlag::from_raw("banana"), EnabledFlag::Disabled);
    assert_eq!(EnabledFlag::from_raw(""), EnabledFlag::Disabled);
    assert_eq!(EnabledFlag::from(7).as_int(), 1);
}

#[test]
fn list_response_accepts_keyed_products_and_has_pre_alias() {
    let response: ProductListResponse = serde_json::from_value(serde_json::json!({
        "success": true,
        "products": {
            "a": { "id": "a", "title": "First" },
            "b": { "id": "b", "title": "Second" }
        },
        "pagination": {
            "total_pages": 3,
            "current_page": 2,
            "has_pre": true,
            "has_next": true,
            "category": ""
        }
    }))
    .expect("decode list");

    let page = CollectionPage::from(response);
    assert_eq!(page.products.len(), 2);
    assert!(page.pagination.has_previous);
    assert_eq!(page.pagination.current_page, 2);
    assert!(page.find(&ProductId::from("b")).is_some());
}

#[test]
fn api_message_joins_validation_lists() {
    let message: ApiMessage =
        serde_json::from_value(serde_json::json!(["title 為必填", "price 為必填"])).expect("decode");
    assert_eq!(message.joined(), "title 為必填; price 為必填");
}

#[test]
fn maps_status_codes_to_error_codes() {
    assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
    assert_eq!(ErrorCode::from_status(403), ErrorCode::Unauthorized);
    assert_eq!(ErrorCode::from_status(404), ErrorCode::NotFound);
    assert_eq!(ErrorCode::from_status(422), ErrorCode::Validation);
    assert_eq!(ErrorCode::from_status(503), ErrorCode::Unavailable);
    assert_eq!(ErrorCode::from_status(500), ErrorCode::Internal);
}

#[test]
fn api_exception_keeps_status() {
    let err = crate::error::ApiException::from_status(413, "too big");
    assert_eq!(err.code, ErrorCode::PayloadTooLarge);
    assert_eq!(err.status, Some(413));
    assert_eq!(err.to_string(), "PayloadTooLarge: too big");
}

#[test]
fn product_fields_accept_loose_shapes() {
    let product: Product = serde_json::from_value(serde_json::json!({
        "title": "Cup",
        "price": "35",
        "origin_price": null,
        "trending": "",
        "is_enabled": true,
        "imagesUrl": null
    }))
    .expect("decode product");
    assert_eq!(product.price, 35.0);
    assert_eq!(product.origin_price, 0.0);
    assert_eq!(product.trending, 0.0);
    assert_eq!(product.is_enabled, EnabledFlag::Enabled);
    assert!(product.images_url.is_empty());

    let disabled: Product =
        serde_json::from_value(serde_json::json!({ "is_enabled": false })).expect("decode");
    assert_eq!(disabled.is_enabled, EnabledFlag::Disabled);
    let missing: Product = serde_json::from_value(serde_json::json!({})).expect("decode");
    assert_eq!(missing.is_enabled, EnabledFlag::Enabled);
}

#[test]
fn list_response_drops_unreadable_records() {
    let response: ProductListResponse = serde_json::from_value(serde_json::json!({
        "success": true,
        "products": {
            "a": { "id": "a", "title": "Loose", "price": "35", "is_enabled": true, "imagesUrl": null },
            "b": { "id": "b", "title": "Broken", "price": "thirty" },
            "c": { "id": "c", "title": "Plain", "price": 12 },
            "d": 42
        },
        "pagination": { "total_pages": 1, "current_page": 1 }
    }))
    .expect("decode list");
    assert_eq!(response.products.skipped, 2);

    let page = CollectionPage::from(response);
    assert_eq!(page.products.len(), 2);
    assert_eq!(page.find(&ProductId::from("a")).map(|p| p.price), Some(35.0));
    assert!(page.find(&ProductId::from("b")).is_none());
}
