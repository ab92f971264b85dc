// src/models/listing.rs

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    /// Registered user behind the listing, if any. Demo sellers have none.
    pub user_id: Option<i64>,
    pub name: String,
    pub verified: bool,
}

/// A skill credential offered on the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,

    /// Price in wallet credits.
    pub price: i64,

    /// Average review rating, 0.0 to 5.0.
    pub rating: f32,
    pub review_count: u32,
    pub skill_level: String,
    pub tags: Vec<String>,
    pub seller: Seller,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Conjunctive filter. Every `None` field is "no constraint".
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f32>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    Newest,
    PriceLowToHigh,
    PriceHighToLow,
    Rating,
    Popular,
}

/// Query parameters for browsing listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f32>,

    /// Search keyword matched against title, description, seller and tags.
    pub q: Option<String>,
    pub sort: Option<SortOption>,
}

impl ListingQuery {
    pub fn filter(&self) -> ListingFilter {
        ListingFilter {
            category: self.category.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            search: self.q.clone(),
        }
    }
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(category) = self.category.as_deref()
            && !category.eq_ignore_ascii_case("all")
            && !listing.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if self.min_price.is_some_and(|min| listing.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| listing.price > max) {
            return false;
        }
        if self.min_rating.is_some_and(|min| listing.rating < min) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                listing.title.to_lowercase().contains(&term)
                    || listing.description.to_lowercase().contains(&term)
                    || listing.seller.name.to_lowercase().contains(&term)
                    || listing.tags.iter().any(|t| t.to_lowercase().contains(&term))
            }
            _ => true,
        }
    }
}

/// Keeps the listings matching every constraint, in their original order.
pub fn apply_filters(listings: &[Listing], filter: &ListingFilter) -> Vec<Listing> {
    listings
        .iter()
        .filter(|listing| filter.matches(listing))
        .cloned()
        .collect()
}

fn by_rating(a: &Listing, b: &Listing) -> Ordering {
    b.rating.total_cmp(&a.rating)
}

/// Orders listings by the chosen key. Stable; ties fall back to id.
pub fn apply_sort(mut listings: Vec<Listing>, option: SortOption) -> Vec<Listing> {
    listings.sort_by(|a, b| {
        let primary = match option {
            SortOption::Newest => b.created_at.cmp(&a.created_at),
            SortOption::PriceLowToHigh => a.price.cmp(&b.price),
            SortOption::PriceHighToLow => b.price.cmp(&a.price),
            SortOption::Rating => by_rating(a, b).then(b.review_count.cmp(&a.review_count)),
            SortOption::Popular => b.review_count.cmp(&a.review_count).then(by_rating(a, b)),
        };
        primary.then(a.id.cmp(&b.id))
    });
    listings
}

/// Category facet with the number of listings in it.
#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

pub fn category_counts(listings: &[Listing]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for listing in listings {
        match counts.iter_mut().find(|c| c.category == listing.category) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                category: listing.category.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| a.category.cmp(&b.category));
    counts
}

/// DTO for creating a listing.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateListingRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(range(min = 0, max = 1_000_000))]
    pub price: i64,
    #[validate(length(min = 1, max = 30))]
    pub skill_level: String,
    #[validate(custom(function = validate_tags))]
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), validator::ValidationError> {
    if tags.len() > 10 {
        return Err(validator::ValidationError::new("too_many_tags"));
    }
    for tag in tags {
        if tag.is_empty() || tag.len() > 30 {
            return Err(validator::ValidationError::new("invalid_tag"));
        }
    }
    Ok(())
}
