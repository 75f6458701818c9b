//! Domain types shared by every subsystem
//!
//! All hot-path types are `Copy` or cheap to clone. Venue and symbol
//! tags that travel through ring buffers use [`FixedStr`] (inline,
//! fixed-capacity) so that pushing a quote or an opportunity never
//! allocates.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Monotonic order identifier, assigned by the order manager at
/// admission time. Strictly increasing within a session, never reused.
pub type OrderId = u64;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderType {
    Market = 0,
    Limit = 1,
    Stop = 2,
    StopLimit = 3,
    TakeProfit = 4,
    TakeProfitLimit = 5,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    New = 0,
    PartiallyFilled = 1,
    Filled = 2,
    Canceled = 3,
    Rejected = 4,
    Expired = 5,
}

impl OrderStatus {
    /// Terminal statuses never transition again.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }
}

/// Time in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TimeInForce {
    /// Good till cancel
    Gtc = 0,
    /// Immediate or cancel
    Ioc = 1,
    /// Fill or kill
    Fok = 2,
    /// Good till crossing (post-only)
    Gtx = 3,
}

/// Closed set of supported venues
///
/// Each venue owns one submission ring in the order manager; the enum
/// doubles as the ring index via [`Venue::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Venue {
    BinanceSpot = 0,
    BinanceFutures = 1,
    BybitSpot = 2,
    BybitFutures = 3,
    OkxSpot = 4,
    OkxFutures = 5,
    Upbit = 6,
}

impl Venue {
    /// Number of venues (and per-venue rings)
    pub const COUNT: usize = 7;

    /// All venues in ring-index order
    pub const ALL: [Venue; Venue::COUNT] = [
        Venue::BinanceSpot,
        Venue::BinanceFutures,
        Venue::BybitSpot,
        Venue::BybitFutures,
        Venue::OkxSpot,
        Venue::OkxFutures,
        Venue::Upbit,
    ];

    /// Dense index into per-venue arrays
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Stable lowercase name, used as the fee-table key
    pub const fn as_str(&self) -> &'static str {
        match self {
            Venue::BinanceSpot => "binance_spot",
            Venue::BinanceFutures => "binance_futures",
            Venue::BybitSpot => "bybit_spot",
            Venue::BybitFutures => "bybit_futures",
            Venue::OkxSpot => "okx_spot",
            Venue::OkxFutures => "okx_futures",
            Venue::Upbit => "upbit",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order as it flows through submission, dispatch and the index
///
/// Before admission only `client_order_id` identifies the order; the
/// dispatch worker assigns `id` and stamps `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_order_id: String,
    pub venue: Venue,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub price: f64,
    pub quantity: f64,
    pub executed_quantity: f64,
    pub status: OrderStatus,
    pub time_in_force: TimeInForce,
    /// Microseconds since the Unix epoch, stamped at admission
    pub created_at: u64,
    /// Microseconds since the Unix epoch, stamped on mutation
    pub updated_at: u64,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            id: 0,
            client_order_id: String::new(),
            venue: Venue::BinanceSpot,
            symbol: String::new(),
            side: Side::Buy,
            order_type: OrderType::Limit,
            price: 0.0,
            quantity: 0.0,
            executed_quantity: 0.0,
            status: OrderStatus::New,
            time_in_force: TimeInForce::Gtc,
            created_at: 0,
            updated_at: 0,
        }
    }
}

impl Order {
    /// Notional value at the limit price
    #[inline(always)]
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Top-of-book update for one (venue, symbol) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketData {
    pub venue: Venue,
    pub bid_price: f64,
    pub bid_quantity: f64,
    pub ask_price: f64,
    pub ask_quantity: f64,
    pub last_price: f64,
    /// Microseconds since the Unix epoch
    pub timestamp: u64,
}

/// Inline fixed-capacity string
///
/// Stores up to `N` bytes of UTF-8 without heap allocation, so it can
/// travel through ring buffers by copy. Construction from a longer
/// input truncates at the capacity (on a char boundary); callers that
/// care must keep venue/symbol tags within `N` bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedStr<const N: usize> {
    buf: [u8; N],
    len: u8,
}

impl<const N: usize> FixedStr<N> {
    /// The empty string
    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    /// Copy from `s`, truncating past `N` bytes
    pub fn from_str(s: &str) -> Self {
        let mut out = Self::new();
        out.push_truncating(s);
        out
    }

    /// Borrow the contents as `&str`
    #[inline(always)]
    pub fn as_str(&self) -> &str {
        // Only ever written from valid &str prefixes on char boundaries
        unsafe { std::str::from_utf8_unchecked(&self.buf[..self.len as usize]) }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push_truncating(&mut self, s: &str) {
        let free = N - self.len as usize;
        let mut take = s.len().min(free);
        while take > 0 && !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.len as usize..self.len as usize + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take as u8;
    }
}

impl<const N: usize> Default for FixedStr<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Display for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> fmt::Debug for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> fmt::Write for FixedStr<N> {
    /// Silently truncates once full; used to format opportunity ids
    /// into a stack buffer without allocating.
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_truncating(s);
        Ok(())
    }
}

impl<const N: usize> PartialEq<&str> for FixedStr<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<const N: usize> From<&str> for FixedStr<N> {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

/// Microseconds since the Unix epoch
#[inline]
pub fn epoch_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Nanoseconds from a process-wide monotonic clock
///
/// Used to stamp price feeds and opportunity windows; comparable only
/// within this process.
#[inline]
pub fn monotonic_nanos() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}
