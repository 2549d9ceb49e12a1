//! GraphQL documents for the Storefront and Admin APIs.
//!
//! The two APIs expose the same product under different field names, so each
//! has its own fragment. Both are shaped to decode into the types in
//! `response.rs`.

use stockroom_core::config::ShopifyApi;

/// Products per page, the API maximum for this query size.
pub const PAGE_SIZE: u32 = 50;

const STOREFRONT_PRODUCT_FIELDS: &str = r#"
fragment ProductFields on Product {
  id
  title
  handle
  description
  descriptionHtml
  productType
  tags
  vendor
  createdAt
  updatedAt
  publishedAt
  availableForSale
  totalInventory
  onlineStoreUrl
  priceRange {
    minVariantPrice { amount currencyCode }
    maxVariantPrice { amount currencyCode }
  }
  images(first: 20) {
    edges { node { id url altText width height } }
  }
  variants(first: 100) {
    edges {
      node {
        id
        title
        sku
        availableForSale
        quantityAvailable
        price { amount currencyCode }
        compareAtPrice { amount currencyCode }
      }
    }
  }
}
"#;

const ADMIN_PRODUCT_FIELDS: &str = r#"
fragment ProductFields on Product {
  id
  title
  handle
  description
  descriptionHtml
  productType
  tags
  vendor
  createdAt
  updatedAt
  publishedAt
  status
  totalInventory
  onlineStoreUrl
  priceRangeV2 {
    minVariantPrice { amount currencyCode }
    maxVariantPrice { amount currencyCode }
  }
  images(first: 20) {
    edges { node { id url altText width height } }
  }
  variants(first: 100) {
    edges {
      node {
        id
        title
        sku
        availableForSale
        inventoryQuantity
        price
        compareAtPrice
      }
    }
  }
}
"#;

const STOREFRONT_SHOP: &str = r#"
query Shop {
  shop {
    id
    name
    description
    primaryDomain { url }
    paymentSettings { currencyCode }
    brand { logo { image { url } } }
  }
}
"#;

const ADMIN_SHOP: &str = r#"
query Shop {
  shop {
    id
    name
    description
    primaryDomain { url }
    currencyCode
  }
}
"#;

fn fragment(api: ShopifyApi) -> &'static str {
    match api {
        ShopifyApi::Storefront => STOREFRONT_PRODUCT_FIELDS,
        ShopifyApi::Admin => ADMIN_PRODUCT_FIELDS,
    }
}

pub fn shop(api: ShopifyApi) -> &'static str {
    match api {
        ShopifyApi::Storefront => STOREFRONT_SHOP,
        ShopifyApi::Admin => ADMIN_SHOP,
    }
}

/// One page of products; variables `$first` and `$after`.
pub fn products(api: ShopifyApi) -> String {
    format!(
        r#"query Products($first: Int!, $after: String) {{
  products(first: $first, after: $after) {{
    pageInfo {{ hasNextPage endCursor }}
    edges {{ node {{ ...ProductFields }} }}
  }}
}}
{}"#,
        fragment(api)
    )
}

/// One product by global id; variable `$id`.
pub fn product_by_id(api: ShopifyApi) -> String {
    format!(
        r#"query ProductById($id: ID!) {{
  product(id: $id) {{ ...ProductFields }}
}}
{}"#,
        fragment(api)
    )
}

/// One product by handle; variable `$handle`. Aliased to `product` on both APIs.
pub fn product_by_handle(api: ShopifyApi) -> String {
    let field = match api {
        ShopifyApi::Storefront => "product(handle: $handle)",
        ShopifyApi::Admin => "product: productByHandle(handle: $handle)",
    };
    format!(
        r#"query ProductByHandle($handle: String!) {{
  {field} {{ ...ProductFields }}
}}
{}"#,
        fragment(api)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_use_api_specific_fields() {
        assert!(products(ShopifyApi::Storefront).contains("quantityAvailable"));
        assert!(products(ShopifyApi::Admin).contains("priceRangeV2"));
        assert!(product_by_handle(ShopifyApi::Admin).contains("product: productByHandle"));
        assert!(product_by_handle(ShopifyApi::Storefront).contains("product(handle: $handle)"));
        assert!(shop(ShopifyApi::Storefront).contains("paymentSettings"));
    }

    #[test]
    fn test_fragment_is_appended_once() {
        let query = product_by_id(ShopifyApi::Storefront);
        assert_eq!(query.matches("fragment ProductFields").count(), 1);
        assert!(query.contains("...ProductFields"));
    }
}
