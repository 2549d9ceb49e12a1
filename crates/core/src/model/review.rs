use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id_string;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Review {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub rating: u8,
    pub review: Option<String>,
    /// RFC 3339 timestamp.
    pub review_date: Option<String>,
    pub buyer_user_id: Option<u64>,
    pub buyer_display_name: String,
    pub is_recommended: bool,
    pub was_helpful: bool,
    pub language: String,
    pub translated_review: Option<String>,
}

/// Review counts per star rating, serialized with `"5"`..`"1"` keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSummary {
    #[serde(rename = "5")]
    pub five: u64,
    #[serde(rename = "4")]
    pub four: u64,
    #[serde(rename = "3")]
    pub three: u64,
    #[serde(rename = "2")]
    pub two: u64,
    #[serde(rename = "1")]
    pub one: u64,
}

impl RatingSummary {
    /// Count one review. Ratings outside 1..=5 are ignored.
    pub fn record(&mut self, rating: u8) {
        match rating {
            5 => self.five += 1,
            4 => self.four += 1,
            3 => self.three += 1,
            2 => self.two += 1,
            1 => self.one += 1,
            _ => {}
        }
    }

    pub fn merge(&mut self, other: &RatingSummary) {
        self.five += other.five;
        self.four += other.four;
        self.three += other.three;
        self.two += other.two;
        self.one += other.one;
    }

    pub fn total(&self) -> u64 {
        self.five + self.four + self.three + self.two + self.one
    }
}

/// Reviews for one listing, cached as `reviews/<listingId>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingReviews {
    #[serde(deserialize_with = "id_string")]
    pub listing_id: String,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub total_reviews: u64,
    #[serde(default)]
    pub average_rating: f64,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub summary: RatingSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ListingReviews {
    pub fn new(listing_id: impl Into<String>, reviews: Vec<Review>) -> Self {
        let mut summary = RatingSummary::default();
        for review in &reviews {
            summary.record(review.rating);
        }

        let total_reviews = reviews.len() as u64;
        let average_rating = if reviews.is_empty() {
            0.0
        } else {
            reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / reviews.len() as f64
        };

        Self {
            listing_id: listing_id.into(),
            reviews,
            total_reviews,
            average_rating,
            last_updated: Utc::now(),
            summary,
            error: None,
        }
    }

    /// Empty record standing in for a listing whose reviews could not be fetched.
    pub fn failed(listing_id: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self { error: Some(format!("Failed to fetch reviews: {message}")), ..Self::new(listing_id, Vec::new()) }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Review statistics across every listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsSummary {
    pub total_products: u64,
    pub products_with_reviews: u64,
    pub total_reviews: u64,
    pub overall_average_rating: f64,
    pub rating_distribution: RatingSummary,
    /// Share of products with at least one review, 0..=100.
    pub reviews_percentage: f64,
    pub last_updated: DateTime<Utc>,
}

impl ReviewsSummary {
    pub fn from_listings<'a>(listings: impl IntoIterator<Item = &'a ListingReviews>) -> Self {
        let mut total_products = 0u64;
        let mut products_with_reviews = 0u64;
        let mut total_reviews = 0u64;
        let mut total_rating = 0.0;
        let mut rating_distribution = RatingSummary::default();

        for listing in listings {
            total_products += 1;
            if listing.total_reviews > 0 {
                products_with_reviews += 1;
                total_reviews += listing.total_reviews;
                total_rating += listing.average_rating * listing.total_reviews as f64;
                rating_distribution.merge(&listing.summary);
            }
        }

        Self {
            total_products,
            products_with_reviews,
            total_reviews,
            overall_average_rating: if total_reviews > 0 { total_rating / total_reviews as f64 } else { 0.0 },
            rating_distribution,
            reviews_percentage: if total_products > 0 {
                products_with_reviews as f64 / total_products as f64 * 100.0
            } else {
                0.0
            },
            last_updated: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review { rating, buyer_display_name: "Anonymous".into(), language: "en".into(), ..Default::default() }
    }

    #[test]
    fn test_listing_reviews_derived_fields() {
        let listing = ListingReviews::new("42", vec![review(5), review(4), review(5), review(2)]);
        assert_eq!(listing.total_reviews, 4);
        assert_eq!(listing.average_rating, 4.0);
        assert_eq!(listing.summary, RatingSummary { five: 2, four: 1, three: 0, two: 1, one: 0 });
        assert!(!listing.is_failed());
    }

    #[test]
    fn test_empty_listing_has_zero_average() {
        let listing = ListingReviews::new("42", Vec::new());
        assert_eq!(listing.average_rating, 0.0);
        assert_eq!(listing.summary.total(), 0);
    }

    #[test]
    fn test_failed_record() {
        let listing = ListingReviews::failed("42", "REMOTE_API_ERROR: status 500");
        assert!(listing.reviews.is_empty());
        assert_eq!(listing.error.as_deref(), Some("Failed to fetch reviews: REMOTE_API_ERROR: status 500"));
    }

    #[test]
    fn test_summary_serializes_star_keys() {
        let value = serde_json::to_value(ListingReviews::new("7", vec![review(5)])).unwrap();
        assert_eq!(value["listingId"], "7");
        assert_eq!(value["summary"]["5"], 1);
        assert_eq!(value["summary"]["1"], 0);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_reviews_summary_across_listings() {
        let listings = vec![
            ListingReviews::new("1", vec![review(5), review(5)]),
            ListingReviews::new("2", vec![review(2)]),
            ListingReviews::new("3", Vec::new()),
            ListingReviews::failed("4", "timeout"),
        ];
        let summary = ReviewsSummary::from_listings(&listings);

        assert_eq!(summary.total_products, 4);
        assert_eq!(summary.products_with_reviews, 2);
        assert_eq!(summary.total_reviews, 3);
        assert_eq!(summary.overall_average_rating, 4.0);
        assert_eq!(summary.rating_distribution, RatingSummary { five: 2, four: 0, three: 0, two: 1, one: 0 });
        assert_eq!(summary.reviews_percentage, 50.0);
    }

    #[test]
    fn test_reviews_summary_empty() {
        let none: Vec<ListingReviews> = Vec::new();
        let summary = ReviewsSummary::from_listings(&none);
        assert_eq!(summary.total_products, 0);
        assert_eq!(summary.overall_average_rating, 0.0);
        assert_eq!(summary.reviews_percentage, 0.0);
    }
}
