//! Realized P&L tracking with a UTC-day rolling reset.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::pipeline::Side;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct PnlTracker {
    realized_total: Decimal,
    realized_today: Decimal,
    trade_count_today: u64,
    day_start: DateTime<Utc>,
}

impl PnlTracker {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            realized_total: Decimal::ZERO,
            realized_today: Decimal::ZERO,
            trade_count_today: 0,
            day_start: day_start_for(now),
        }
    }

    #[must_use]
    pub const fn realized_total(&self) -> Decimal {
        self.realized_total
    }

    #[must_use]
    pub const fn trade_count_today(&self) -> u64 {
        self.trade_count_today
    }

    /// Realized P&L since the current UTC-day boundary, rolling forward if
    /// `now` has crossed into a new day.
    pub fn realized_today(&mut self, now: DateTime<Utc>) -> Decimal {
        self.roll_day(now);
        self.realized_today
    }

    /// Compute the realized P&L for closing `close_size` of a position with
    /// `entry_price` and `side`, at `exit_price`, and fold it in.
    pub fn record_close(
        &mut self,
        side: Side,
        entry_price: Decimal,
        exit_price: Decimal,
        close_size: Decimal,
        now: DateTime<Utc>,
    ) -> Decimal {
        self.roll_day(now);
        let realized = match side {
            Side::Buy => (exit_price - entry_price) * close_size,
            Side::Sell => (entry_price - exit_price) * close_size,
        };
        self.realized_total += realized;
        self.realized_today += realized;
        self.trade_count_today += 1;
        realized
    }

    fn roll_day(&mut self, now: DateTime<Utc>) {
        let current_day_start = day_start_for(now);
        if now.timestamp() >= self.day_start.timestamp() + SECONDS_PER_DAY {
            self.day_start = current_day_start;
            self.realized_today = Decimal::ZERO;
            self.trade_count_today = 0;
        }
    }
}

fn day_start_for(now: DateTime<Utc>) -> DateTime<Utc> {
    let epoch = now.timestamp();
    let start = epoch - epoch.rem_euclid(SECONDS_PER_DAY);
    DateTime::from_timestamp(start, 0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn record_close_buy_profits_on_price_increase() {
        let mut tracker = PnlTracker::new(Utc::now());
        let realized = tracker.record_close(Side::Buy, dec!(0.50), dec!(0.70), dec!(100), Utc::now());
        assert_eq!(realized, dec!(20));
        assert_eq!(tracker.realized_total(), dec!(20));
    }

    #[test]
    fn record_close_buy_loses_on_price_decrease() {
        let mut tracker = PnlTracker::new(Utc::now());
        let realized = tracker.record_close(Side::Buy, dec!(0.50), dec!(0.30), dec!(100), Utc::now());
        assert_eq!(realized, dec!(-20));
    }

    #[test]
    fn record_close_sell_profits_on_price_decrease() {
        let mut tracker = PnlTracker::new(Utc::now());
        let realized = tracker.record_close(Side::Sell, dec!(0.50), dec!(0.30), dec!(100), Utc::now());
        assert_eq!(realized, dec!(20));
    }

    #[test]
    fn rolling_day_resets_today_but_not_total() {
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut tracker = PnlTracker::new(t0);
        tracker.record_close(Side::Buy, dec!(0.5), dec!(0.6), dec!(10), t0);
        assert_eq!(tracker.realized_today(t0), dec!(1));

        let next_day = t0 + chrono::Duration::seconds(SECONDS_PER_DAY + 10);
        assert_eq!(tracker.realized_today(next_day), Decimal::ZERO);
        assert_eq!(tracker.realized_total(), dec!(1));
    }
}
