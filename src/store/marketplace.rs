// src/store/marketplace.rs

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::Serialize;

use super::{read, write};
use crate::{
    error::AppError,
    models::{
        listing::Listing,
        wallet::{TransactionKind, Wallet, WalletTransaction},
    },
};

/// Listings and wallets share one lock so a purchase moves credits atomically.
#[derive(Default)]
struct MarketTables {
    last_listing_id: i64,
    listings: Vec<Listing>,
    wallets: HashMap<i64, Wallet>,
    /// (buyer, listing) pairs already purchased.
    owned: HashSet<(i64, i64)>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseReceipt {
    pub listing_id: i64,
    pub price: i64,
    pub balance: i64,
    pub transaction: WalletTransaction,
}

#[derive(Clone, Default)]
pub struct MarketplaceStore {
    tables: Arc<RwLock<MarketTables>>,
}

impl MarketplaceStore {
    /// Stores a listing, assigning its id.
    pub fn add_listing(&self, mut listing: Listing) -> Listing {
        let mut tables = write(&self.tables);
        tables.last_listing_id += 1;
        listing.id = tables.last_listing_id;
        tables.listings.push(listing.clone());
        listing
    }

    /// Snapshot of the full catalog, in insertion order.
    pub fn listings(&self) -> Vec<Listing> {
        read(&self.tables).listings.clone()
    }

    pub fn get_listing(&self, id: i64) -> Result<Listing, AppError> {
        read(&self.tables)
            .listings
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(AppError::NotFound(format!("Listing {} not found", id)))
    }

    pub fn open_wallet(&self, user_id: i64, starter_credits: i64) -> Wallet {
        write(&self.tables)
            .wallets
            .entry(user_id)
            .or_insert_with(|| Wallet::open(user_id, starter_credits, Utc::now()))
            .clone()
    }

    pub fn wallet(&self, user_id: i64) -> Result<Wallet, AppError> {
        read(&self.tables)
            .wallets
            .get(&user_id)
            .cloned()
            .ok_or(AppError::NotFound("Wallet not found".to_string()))
    }

    /// Drops a user's wallet and listings.
    pub fn remove_user(&self, user_id: i64) {
        let mut tables = write(&self.tables);
        tables.wallets.remove(&user_id);
        tables.owned.retain(|(buyer, _)| *buyer != user_id);
        tables.listings.retain(|l| l.seller.user_id != Some(user_id));
    }

    /// Debits the buyer and credits the seller (when the seller has a wallet).
    pub fn purchase(&self, buyer_id: i64, listing_id: i64) -> Result<PurchaseReceipt, AppError> {
        let mut tables = write(&self.tables);

        let listing = tables
            .listings
            .iter()
            .find(|l| l.id == listing_id)
            .cloned()
            .ok_or(AppError::NotFound(format!("Listing {} not found", listing_id)))?;

        if listing.seller.user_id == Some(buyer_id) {
            return Err(AppError::BadRequest("You cannot buy your own listing".to_string()));
        }
        if tables.owned.contains(&(buyer_id, listing_id)) {
            return Err(AppError::Conflict("Listing already purchased".to_string()));
        }

        let now = Utc::now();
        let buyer = tables
            .wallets
            .get_mut(&buyer_id)
            .ok_or(AppError::NotFound("Wallet not found".to_string()))?;
        if !buyer.can_afford(listing.price) {
            return Err(AppError::BadRequest(format!(
                "Insufficient balance: {} credits needed, {} available",
                listing.price, buyer.balance
            )));
        }
        let transaction = buyer
            .record(
                TransactionKind::Purchase,
                -listing.price,
                Some(listing.id),
                &format!("Purchased '{}'", listing.title),
                now,
            )
            .clone();
        let balance = buyer.balance;

        if let Some(seller_id) = listing.seller.user_id
            && let Some(seller) = tables.wallets.get_mut(&seller_id)
        {
            seller.record(
                TransactionKind::Sale,
                listing.price,
                Some(listing.id),
                &format!("Sold '{}'", listing.title),
                now,
            );
        }

        tables.owned.insert((buyer_id, listing_id));

        Ok(PurchaseReceipt {
            listing_id,
            price: listing.price,
            balance,
            transaction,
        })
    }
}
