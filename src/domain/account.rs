//! Trading account state: cash balance, open units, and the trade journal.
//!
//! Market orders fill at the candle mid shifted by half the spread:
//! buys pay the ask side, sells receive the bid side. With spread
//! accounting disabled both sides fill at mid.

use super::candle::{PriceBar, TIMESTAMP_FMT};

/// Order sizing: an explicit unit count, or a cash amount converted
/// to whole units at the execution price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Order {
    Units(i64),
    Amount(f64),
}

#[derive(Debug, Clone)]
pub struct Account {
    pub initial_balance: f64,
    pub current_balance: f64,
    pub units: i64,
    pub trades: usize,
    pub use_spread: bool,
    pub journal: Vec<String>,
}

impl Account {
    pub fn new(amount: f64, use_spread: bool) -> Self {
        Account {
            initial_balance: amount,
            current_balance: amount,
            units: 0,
            trades: 0,
            use_spread,
            journal: Vec::new(),
        }
    }

    pub fn is_long(&self) -> bool {
        self.units > 0
    }

    pub fn is_short(&self) -> bool {
        self.units < 0
    }

    pub fn is_flat(&self) -> bool {
        self.units == 0
    }

    fn buy_price(&self, bar: &PriceBar) -> f64 {
        if self.use_spread { bar.ask() } else { bar.mid }
    }

    fn sell_price(&self, bar: &PriceBar) -> f64 {
        if self.use_spread { bar.bid() } else { bar.mid }
    }

    /// Execute a market buy. Returns the units bought; zero-unit
    /// orders are a no-op and do not count as a trade.
    pub fn buy(&mut self, bar: &PriceBar, order: Order) -> i64 {
        let price = self.buy_price(bar);
        let units = match order {
            Order::Units(u) => u,
            Order::Amount(amount) => (amount / price).floor() as i64,
        };
        if units <= 0 {
            return 0;
        }

        self.current_balance -= units as f64 * price;
        self.units += units;
        self.trades += 1;
        self.journal.push(format!(
            "{} |  Buying {} for {:.5}",
            bar.time.format(TIMESTAMP_FMT),
            units,
            price,
        ));
        units
    }

    /// Execute a market sell. Returns the units sold; zero-unit
    /// orders are a no-op and do not count as a trade.
    pub fn sell(&mut self, bar: &PriceBar, order: Order) -> i64 {
        let price = self.sell_price(bar);
        let units = match order {
            Order::Units(u) => u,
            Order::Amount(amount) => (amount / price).floor() as i64,
        };
        if units <= 0 {
            return 0;
        }

        self.current_balance += units as f64 * price;
        self.units -= units;
        self.trades += 1;
        self.journal.push(format!(
            "{} |  Selling {} for {:.5}",
            bar.time.format(TIMESTAMP_FMT),
            units,
            price,
        ));
        units
    }

    /// Marked-to-mid value of the open units.
    pub fn position_value(&self, bar: &PriceBar) -> f64 {
        self.units as f64 * bar.mid
    }

    /// Net asset value: cash plus open units at mid.
    pub fn nav(&self, bar: &PriceBar) -> f64 {
        self.current_balance + self.position_value(bar)
    }

    /// (current - initial) / initial, in percent.
    pub fn performance_pct(&self) -> f64 {
        if self.initial_balance == 0.0 {
            return 0.0;
        }
        (self.current_balance - self.initial_balance) / self.initial_balance * 100.0
    }

    /// Settle any remaining units at mid, charge the residual
    /// half-spread, and journal the closing summary. Works for both
    /// long and short residues.
    pub fn close_out(&mut self, bar: &PriceBar) {
        let ts = bar.time.format(TIMESTAMP_FMT);
        let rule = "-".repeat(75);

        self.journal.push(rule.clone());
        self.journal.push(format!("{ts} | +++ CLOSING FINAL POSITION +++"));

        self.current_balance += self.units as f64 * bar.mid;
        if self.use_spread {
            self.current_balance -= self.units.unsigned_abs() as f64 * bar.spread / 2.0;
        }

        self.journal.push(format!(
            "{ts} | closing position of {} for {:.5}",
            self.units, bar.mid,
        ));

        self.units = 0;
        self.trades += 1;

        self.journal
            .push(format!("{ts} | current balance: {:.2}", self.current_balance));
        self.journal.push(format!(
            "{ts} | net performance (%) = {:.2}",
            self.performance_pct(),
        ));
        self.journal
            .push(format!("{ts} | number of trades executed = {}", self.trades));
        self.journal.push(rule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::parse_timestamp;

    fn bar(mid: f64, spread: f64) -> PriceBar {
        PriceBar {
            time: parse_timestamp("2020-06-15 10:00:00").unwrap(),
            mid,
            spread,
            log_return: None,
        }
    }

    #[test]
    fn new_account_is_flat() {
        let account = Account::new(100_000.0, true);
        assert!(account.is_flat());
        assert!(!account.is_long());
        assert!(!account.is_short());
        assert_eq!(account.trades, 0);
        assert!(account.journal.is_empty());
        assert!((account.nav(&bar(1.0, 0.0)) - 100_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn buy_units_without_spread() {
        let mut account = Account::new(100_000.0, false);
        let filled = account.buy(&bar(2.0, 0.1), Order::Units(1_000));

        assert_eq!(filled, 1_000);
        assert_eq!(account.units, 1_000);
        assert_eq!(account.trades, 1);
        // fills at mid, spread ignored
        assert!((account.current_balance - 98_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn buy_pays_the_ask_side() {
        let mut account = Account::new(100_000.0, true);
        account.buy(&bar(2.0, 0.2), Order::Units(1_000));
        // 1000 * 2.1
        assert!((account.current_balance - 97_900.0).abs() < 1e-9);
    }

    #[test]
    fn sell_receives_the_bid_side() {
        let mut account = Account::new(100_000.0, true);
        account.sell(&bar(2.0, 0.2), Order::Units(1_000));
        assert_eq!(account.units, -1_000);
        // 1000 * 1.9
        assert!((account.current_balance - 101_900.0).abs() < 1e-9);
    }

    #[test]
    fn amount_orders_floor_to_whole_units() {
        let mut account = Account::new(100_000.0, false);
        let filled = account.buy(&bar(3.0, 0.0), Order::Amount(10_000.0));
        assert_eq!(filled, 3_333);
        assert!((account.current_balance - (100_000.0 - 3_333.0 * 3.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_unit_order_is_a_no_op() {
        let mut account = Account::new(100.0, false);
        let filled = account.buy(&bar(500.0, 0.0), Order::Amount(100.0));
        assert_eq!(filled, 0);
        assert_eq!(account.trades, 0);
        assert!(account.journal.is_empty());
        assert!((account.current_balance - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn journal_records_fills() {
        let mut account = Account::new(100_000.0, false);
        account.buy(&bar(1.25, 0.0), Order::Units(10));
        account.sell(&bar(1.30, 0.0), Order::Units(10));

        assert_eq!(account.journal.len(), 2);
        assert!(account.journal[0].contains("Buying 10 for 1.25000"));
        assert!(account.journal[1].contains("Selling 10 for 1.30000"));
    }

    #[test]
    fn nav_marks_open_units_to_mid() {
        let mut account = Account::new(100_000.0, false);
        account.buy(&bar(2.0, 0.0), Order::Units(1_000));
        assert!((account.nav(&bar(2.5, 0.0)) - 100_500.0).abs() < 1e-9);
        assert!((account.position_value(&bar(2.5, 0.0)) - 2_500.0).abs() < 1e-9);
    }

    #[test]
    fn flat_round_trip_without_spread_conserves_balance() {
        let mut account = Account::new(100_000.0, false);
        account.buy(&bar(1.10, 0.0), Order::Units(5_000));
        account.sell(&bar(1.10, 0.0), Order::Units(5_000));
        assert!((account.current_balance - 100_000.0).abs() < 1e-9);
        assert!(account.is_flat());
        assert_eq!(account.trades, 2);
    }

    #[test]
    fn round_trip_with_spread_costs_the_spread() {
        let mut account = Account::new(100_000.0, true);
        account.buy(&bar(1.10, 0.0002), Order::Units(10_000));
        account.sell(&bar(1.10, 0.0002), Order::Units(10_000));
        // full spread paid across the two fills
        assert!((account.current_balance - (100_000.0 - 10_000.0 * 0.0002)).abs() < 1e-9);
    }

    #[test]
    fn close_out_settles_long() {
        let mut account = Account::new(100_000.0, false);
        account.buy(&bar(2.0, 0.0), Order::Units(1_000));
        account.close_out(&bar(2.5, 0.0));

        assert!(account.is_flat());
        assert_eq!(account.trades, 2);
        assert!((account.current_balance - 100_500.0).abs() < 1e-9);
        assert!((account.performance_pct() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn close_out_settles_short() {
        let mut account = Account::new(100_000.0, false);
        account.sell(&bar(2.0, 0.0), Order::Units(1_000));
        account.close_out(&bar(1.5, 0.0));

        assert!(account.is_flat());
        assert!((account.current_balance - 100_500.0).abs() < 1e-9);
    }

    #[test]
    fn close_out_charges_residual_half_spread() {
        let mut account = Account::new(100_000.0, true);
        account.buy(&bar(2.0, 0.0), Order::Units(1_000));
        account.close_out(&bar(2.0, 0.1));

        // settle at mid, minus 1000 * 0.05
        assert!((account.current_balance - (100_000.0 - 50.0)).abs() < 1e-9);
    }

    #[test]
    fn close_out_journals_summary_block() {
        let mut account = Account::new(100_000.0, false);
        account.buy(&bar(2.0, 0.0), Order::Units(100));
        account.close_out(&bar(2.0, 0.0));

        let text = account.journal.join("\n");
        assert!(text.contains("+++ CLOSING FINAL POSITION +++"));
        assert!(text.contains("net performance (%) = 0.00"));
        assert!(text.contains("number of trades executed = 2"));
    }

    #[test]
    fn close_out_on_flat_account_books_nothing() {
        let mut account = Account::new(100_000.0, true);
        account.close_out(&bar(2.0, 0.5));

        assert!((account.current_balance - 100_000.0).abs() < f64::EPSILON);
        assert_eq!(account.trades, 1);
    }

    #[test]
    fn performance_pct_zero_initial_balance() {
        let account = Account::new(0.0, false);
        assert!((account.performance_pct() - 0.0).abs() < f64::EPSILON);
    }
}
