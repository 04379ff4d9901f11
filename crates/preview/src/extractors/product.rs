// ABOUTME: Product field extraction: schema.org Product/Offer first, DOM selectors second.
// ABOUTME: Produces price, currency, rating, review count, availability and brand.

use once_cell::sync::Lazy;
use regex::Regex;

use super::fields::{extract_field_text_single, extract_first_attr, parse_count};
use crate::dom::ParsedDocument;
use crate::preview::ProductDetails;
use crate::schema::{normalize_type, SchemaRecord, SchemaSet, PRODUCT_TYPES};

static PRICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());

static RATING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());

const PRICE_SELECTORS: &[&str] = &[
    "meta[property='product:price:amount']",
    "meta[property='og:price:amount']",
    "meta[itemprop='price']",
    "[itemprop='price']",
    ".product-price",
    ".price",
];

const CURRENCY_SELECTORS: &[&str] = &[
    "meta[property='product:price:currency']",
    "meta[property='og:price:currency']",
    "meta[itemprop='priceCurrency']",
];

const RATING_SELECTORS: &[&str] = &[
    "meta[itemprop='ratingValue']",
    "[itemprop='ratingValue']",
    ".rating-value",
    ".average-rating",
];

const REVIEW_COUNT_SELECTORS: &[&str] = &[
    "meta[itemprop='reviewCount']",
    "[itemprop='reviewCount']",
    "meta[itemprop='ratingCount']",
    "[itemprop='ratingCount']",
    ".review-count",
    ".reviews-count",
];

const AVAILABILITY_SELECTORS: &[&str] = &[
    "meta[property='product:availability']",
    "meta[property='og:availability']",
    "meta[itemprop='availability']",
    ".availability",
    ".stock-status",
];

const BRAND_SELECTORS: &[&str] = &[
    "meta[property='product:brand']",
    "meta[itemprop='brand']",
    "[itemprop='brand'] [itemprop='name']",
    "[itemprop='brand']",
    ".product-brand",
    ".brand",
];

/// Currency code for a leading or trailing symbol in a price string.
pub fn currency_from_symbol(text: &str) -> Option<String> {
    let code = if text.contains('€') {
        "EUR"
    } else if text.contains('£') {
        "GBP"
    } else if text.contains('¥') {
        "JPY"
    } else if text.contains('₹') {
        "INR"
    } else if text.contains('$') {
        "USD"
    } else {
        return None;
    };
    Some(code.to_string())
}

/// Numeric portion of a display price (`"$1,299.00"` -> `"1,299.00"`).
pub fn clean_price(text: &str) -> Option<String> {
    PRICE_RE.find(text).map(|m| m.as_str().to_string())
}

fn parse_rating(text: &str) -> Option<f64> {
    RATING_RE
        .find(text)
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
}

/// `https://schema.org/InStock` -> `InStock`.
fn normalize_availability(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.contains('/') || trimmed.contains(':') {
        normalize_type(trimmed)
    } else {
        trimmed.to_string()
    }
}

fn schema_price(record: &SchemaRecord) -> Option<String> {
    record.first_text(&[
        &["offers", "price"],
        &["offers", "lowPrice"],
        &["offers", "priceSpecification", "price"],
        &["price"],
    ])
}

/// Product details from structured data, falling back to page markup.
pub fn extract_product(doc: &ParsedDocument, schemas: &SchemaSet) -> ProductDetails {
    let record = schemas.find(PRODUCT_TYPES);
    let record = record.as_ref();

    let dom_price_text = extract_field_text_single(doc, PRICE_SELECTORS);

    let price = record
        .and_then(schema_price)
        .or_else(|| dom_price_text.as_deref().and_then(clean_price));

    let currency = record
        .and_then(|r| r.first_text(&[&["offers", "priceCurrency"], &["priceCurrency"]]))
        .or_else(|| extract_first_attr(doc, CURRENCY_SELECTORS, "content"))
        .or_else(|| dom_price_text.as_deref().and_then(currency_from_symbol));

    let rating = record
        .and_then(|r| r.text_at(&["aggregateRating", "ratingValue"]))
        .or_else(|| extract_field_text_single(doc, RATING_SELECTORS))
        .and_then(|t| parse_rating(&t));

    let review_count = record
        .and_then(|r| {
            r.first_text(&[
                &["aggregateRating", "reviewCount"],
                &["aggregateRating", "ratingCount"],
            ])
        })
        .or_else(|| extract_field_text_single(doc, REVIEW_COUNT_SELECTORS))
        .and_then(|t| parse_count(&t));

    let availability = record
        .and_then(|r| r.text_at(&["offers", "availability"]))
        .or_else(|| extract_first_attr(doc, &["link[itemprop='availability']"], "href"))
        .or_else(|| extract_field_text_single(doc, AVAILABILITY_SELECTORS))
        .map(|a| normalize_availability(&a));

    let brand = record
        .and_then(|r| r.text_at(&["brand"]))
        .or_else(|| extract_field_text_single(doc, BRAND_SELECTORS));

    ProductDetails {
        price,
        currency,
        rating,
        review_count,
        availability,
        brand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(html: &str) -> ProductDetails {
        let doc = ParsedDocument::parse(html).unwrap();
        let schemas = SchemaSet::collect(&doc);
        extract_product(&doc, &schemas)
    }

    #[test]
    fn test_minimal_schema_price() {
        let details = run(
            r#"<html><head><script type="application/ld+json">{"@type":"Product","offers":{"price":"19.99"}}</script></head><body></body></html>"#,
        );
        assert_eq!(details.price.as_deref(), Some("19.99"));
    }

    #[test]
    fn test_full_schema_product() {
        let details = run(
            r#"<html><head><script type="application/ld+json">
            {"@context":"https://schema.org","@graph":[
              {"@type":"WebPage","name":"Shop"},
              {"@type":"Product","name":"Widget","brand":{"@type":"Brand","name":"Acme"},
               "offers":[{"@type":"Offer","price":24.5,"priceCurrency":"EUR","availability":"https://schema.org/InStock"}],
               "aggregateRating":{"@type":"AggregateRating","ratingValue":"4.6","reviewCount":"1,204"}}
            ]}
            </script></head><body></body></html>"#,
        );
        assert_eq!(
            details,
            ProductDetails {
                price: Some("24.5".to_string()),
                currency: Some("EUR".to_string()),
                rating: Some(4.6),
                review_count: Some(1204),
                availability: Some("InStock".to_string()),
                brand: Some("Acme".to_string()),
            }
        );
    }

    #[test]
    fn test_dom_fallback() {
        let details = run(
            r#"<body>
                <h1 class="product-title">Lamp</h1>
                <span class="price">£1,299.00</span>
                <div class="rating-value">4,5 out of 5</div>
                <span class="review-count">(87 reviews)</span>
                <span class="availability">In stock</span>
                <span class="brand">Lumen</span>
            </body>"#,
        );
        assert_eq!(details.price.as_deref(), Some("1,299.00"));
        assert_eq!(details.currency.as_deref(), Some("GBP"));
        assert_eq!(details.rating, Some(4.5));
        assert_eq!(details.review_count, Some(87));
        assert_eq!(details.availability.as_deref(), Some("In stock"));
        assert_eq!(details.brand.as_deref(), Some("Lumen"));
    }

    #[test]
    fn test_microdata_product() {
        let details = run(
            r#"<body><div itemscope itemtype="https://schema.org/Product">
                <span itemprop="name">Kettle</span>
                <div itemprop="offers" itemscope itemtype="https://schema.org/Offer">
                    <meta itemprop="priceCurrency" content="USD">
                    <span itemprop="price" content="39.00">$39</span>
                    <link itemprop="availability" href="https://schema.org/OutOfStock">
                </div>
            </div></body>"#,
        );
        assert_eq!(details.price.as_deref(), Some("39.00"));
        assert_eq!(details.currency.as_deref(), Some("USD"));
        assert_eq!(details.availability.as_deref(), Some("OutOfStock"));
    }

    #[test]
    fn test_empty_page_yields_empty_details() {
        assert_eq!(run("<body><p>nothing</p></body>"), ProductDetails::default());
    }

    #[test]
    fn test_currency_from_symbol() {
        assert_eq!(currency_from_symbol("$5").as_deref(), Some("USD"));
        assert_eq!(currency_from_symbol("5 €").as_deref(), Some("EUR"));
        assert_eq!(currency_from_symbol("5").as_deref(), None);
    }
}
