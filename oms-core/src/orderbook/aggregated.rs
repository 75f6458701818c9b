//! Multi-venue order book aggregation
//!
//! Merges per-venue ladders into one view per symbol: bids sorted
//! descending, asks ascending, each level tagged with its venue.
//! Same-price levels from different venues are kept side by side
//! rather than collapsed, so consumers must tolerate duplicate
//! prices.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::core::types::{epoch_micros, Side, Venue};

/// One price level, tagged with the venue it lives on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookLevel {
    pub price: f64,
    pub quantity: f64,
    pub venue: Venue,
    pub num_orders: u32,
}

/// A (possibly merged) two-sided book
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    /// Microseconds since the Unix epoch of the freshest contribution
    pub last_update: u64,
}

/// Aggregated multi-exchange view, one writer at a time
pub struct AggregatedOrderBook {
    // symbol -> venue -> book
    books: RwLock<HashMap<String, HashMap<Venue, Book>>>,
}

impl AggregatedOrderBook {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
        }
    }

    /// Replace a venue's ladder for `symbol`
    pub fn update_book(&self, venue: Venue, symbol: &str, bids: Vec<BookLevel>, asks: Vec<BookLevel>) {
        let mut books = self.books.write();
        let book = books
            .entry(symbol.to_string())
            .or_default()
            .entry(venue)
            .or_default();

        book.bids = bids;
        book.asks = asks;
        book.last_update = epoch_micros();
    }

    /// Merge every venue's ladder for `symbol`
    pub fn get_aggregated_book(&self, symbol: &str) -> Book {
        let books = self.books.read();
        let Some(venues) = books.get(symbol) else {
            return Book::default();
        };

        let mut merged = Book::default();
        for book in venues.values() {
            merged.bids.extend_from_slice(&book.bids);
            merged.asks.extend_from_slice(&book.asks);
            merged.last_update = merged.last_update.max(book.last_update);
        }

        merged
            .bids
            .sort_by(|a, b| b.price.total_cmp(&a.price));
        merged.asks.sort_by(|a, b| a.price.total_cmp(&b.price));

        merged
    }

    /// Best bid and ask across all venues
    ///
    /// Empty sides return sentinel levels: zero-price bid and
    /// max-price ask, both on the default venue.
    pub fn get_best_bid_ask(&self, symbol: &str) -> (BookLevel, BookLevel) {
        let book = self.get_aggregated_book(symbol);

        let best_bid = book.bids.first().copied().unwrap_or(BookLevel {
            price: 0.0,
            quantity: 0.0,
            venue: Venue::BinanceSpot,
            num_orders: 0,
        });

        let best_ask = book.asks.first().copied().unwrap_or(BookLevel {
            price: f64::MAX,
            quantity: 0.0,
            venue: Venue::BinanceSpot,
            num_orders: 0,
        });

        (best_bid, best_ask)
    }

    /// Venue of the first merged level whose cumulative size covers
    /// `quantity`, walking from the top of the relevant side
    ///
    /// Falls back to the best level's venue when total liquidity is
    /// short, and to the default venue when the side is empty.
    pub fn get_best_exchange(&self, symbol: &str, side: Side, quantity: f64) -> Venue {
        let book = self.get_aggregated_book(symbol);

        // Buyers take asks, sellers hit bids
        let levels = match side {
            Side::Buy => &book.asks,
            Side::Sell => &book.bids,
        };

        if let Some(first) = levels.first() {
            let mut cumulative = 0.0;
            for level in levels {
                cumulative += level.quantity;
                if cumulative >= quantity {
                    return level.venue;
                }
            }
            return first.venue;
        }

        Venue::BinanceSpot
    }
}

impl Default for AggregatedOrderBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: f64, quantity: f64, venue: Venue) -> BookLevel {
        BookLevel {
            price,
            quantity,
            venue,
            num_orders: 1,
        }
    }

    fn sample_book() -> AggregatedOrderBook {
        let book = AggregatedOrderBook::new();
        book.update_book(
            Venue::BinanceSpot,
            "BTCUSDT",
            vec![level(100.0, 1.0, Venue::BinanceSpot), level(99.0, 2.0, Venue::BinanceSpot)],
            vec![level(101.0, 1.0, Venue::BinanceSpot), level(102.0, 2.0, Venue::BinanceSpot)],
        );
        book.update_book(
            Venue::OkxSpot,
            "BTCUSDT",
            vec![level(100.5, 0.5, Venue::OkxSpot)],
            vec![level(100.8, 0.5, Venue::OkxSpot)],
        );
        book
    }

    #[test]
    fn test_merge_sorts_both_sides() {
        let book = sample_book().get_aggregated_book("BTCUSDT");

        let bid_prices: Vec<f64> = book.bids.iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![100.5, 100.0, 99.0]);

        let ask_prices: Vec<f64> = book.asks.iter().map(|l| l.price).collect();
        assert_eq!(ask_prices, vec![100.8, 101.0, 102.0]);

        assert!(book.last_update > 0);
    }

    #[test]
    fn test_best_bid_ask() {
        let (bid, ask) = sample_book().get_best_bid_ask("BTCUSDT");
        assert_eq!(bid.price, 100.5);
        assert_eq!(bid.venue, Venue::OkxSpot);
        assert_eq!(ask.price, 100.8);
        assert_eq!(ask.venue, Venue::OkxSpot);
    }

    #[test]
    fn test_best_bid_ask_sentinels_when_unknown() {
        let book = AggregatedOrderBook::new();
        let (bid, ask) = book.get_best_bid_ask("NOPE");
        assert_eq!(bid.price, 0.0);
        assert_eq!(ask.price, f64::MAX);
    }

    #[test]
    fn test_best_exchange_cumulative_walk() {
        let book = sample_book();

        // 0.3 fits entirely on the best ask level (OKX)
        assert_eq!(book.get_best_exchange("BTCUSDT", Side::Buy, 0.3), Venue::OkxSpot);

        // 1.2 needs the second level too (Binance 101.0)
        assert_eq!(
            book.get_best_exchange("BTCUSDT", Side::Buy, 1.2),
            Venue::BinanceSpot
        );

        // More than total liquidity falls back to the best level's venue
        assert_eq!(
            book.get_best_exchange("BTCUSDT", Side::Buy, 100.0),
            Venue::OkxSpot
        );

        // Unknown symbol falls back to the default venue
        assert_eq!(
            book.get_best_exchange("NOPE", Side::Sell, 1.0),
            Venue::BinanceSpot
        );
    }

    #[test]
    fn test_duplicate_prices_are_kept() {
        let book = AggregatedOrderBook::new();
        book.update_book(
            Venue::BinanceSpot,
            "ETHUSDT",
            vec![level(100.0, 1.0, Venue::BinanceSpot)],
            vec![],
        );
        book.update_book(
            Venue::BybitSpot,
            "ETHUSDT",
            vec![level(100.0, 2.0, Venue::BybitSpot)],
            vec![],
        );

        let merged = book.get_aggregated_book("ETHUSDT");
        assert_eq!(merged.bids.len(), 2);
        assert_eq!(merged.bids[0].price, merged.bids[1].price);
    }

    #[test]
    fn test_update_replaces_venue_ladder() {
        let book = sample_book();
        book.update_book(
            Venue::OkxSpot,
            "BTCUSDT",
            vec![level(99.5, 1.0, Venue::OkxSpot)],
            vec![level(103.0, 1.0, Venue::OkxSpot)],
        );

        let (bid, ask) = book.get_best_bid_ask("BTCUSDT");
        assert_eq!(bid.price, 100.0);
        assert_eq!(ask.price, 101.0);
    }
}
