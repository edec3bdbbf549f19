//! Moving-average crossover signal engine.
//!
//! Scans a close series once, tracking a FLAT/LONG position:
//! - FLAT -> LONG with a BUY when SMA(short) > SMA(long)
//! - LONG -> FLAT with a SELL when SMA(short) < SMA(long)
//! - equal averages never transition
//!
//! A position still open after the scan is closed with a SELL at the last
//! close, so every BUY is paired. Return is the sum of per-pair fractional
//! returns, expressed in percent. No costs, no sizing, one instrument.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::error::CrossoverError;
use crate::domain::moving_average::moving_average;
use crate::domain::price_bar::StoredBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeEvent {
    pub timestamp: NaiveDateTime,
    pub action: TradeAction,
    pub price: f64,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub strategy_name: String,
    pub total_return_percent: f64,
    pub num_trades: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub trades: Vec<TradeEvent>,
}

impl PerformanceSummary {
    fn from_trades(strategy_name: String, trades: Vec<TradeEvent>) -> Self {
        let mut pnl = 0.0;
        for pair in trades.chunks_exact(2) {
            let (buy, sell) = (&pair[0], &pair[1]);
            pnl += (sell.price - buy.price) / buy.price;
        }

        let buy_signals = trades
            .iter()
            .filter(|t| t.action == TradeAction::Buy)
            .count();

        Self {
            strategy_name,
            total_return_percent: pnl * 100.0,
            num_trades: trades.len() / 2,
            buy_signals,
            sell_signals: trades.len() - buy_signals,
            trades,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Flat,
    Long,
}

/// SMA crossover over a (short, long) window pair; `short_window < long_window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmaCrossover {
    short_window: usize,
    long_window: usize,
}

impl SmaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, CrossoverError> {
        if short_window == 0 {
            return Err(CrossoverError::invalid_parameter(
                "short_window",
                "window must be > 0",
            ));
        }
        if long_window == 0 {
            return Err(CrossoverError::invalid_parameter(
                "long_window",
                "window must be > 0",
            ));
        }
        if short_window >= long_window {
            return Err(CrossoverError::invalid_parameter(
                "long_window",
                format!(
                    "long_window ({long_window}) must be greater than short_window ({short_window})"
                ),
            ));
        }
        Ok(Self {
            short_window,
            long_window,
        })
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }

    /// Replaces either window with a caller-supplied value, revalidating the pair.
    pub fn with_overrides(
        &self,
        short_window: Option<i64>,
        long_window: Option<i64>,
    ) -> Result<Self, CrossoverError> {
        let short = match short_window {
            Some(w) => window_from_i64("short_window", w)?,
            None => self.short_window,
        };
        let long = match long_window {
            Some(w) => window_from_i64("long_window", w)?,
            None => self.long_window,
        };
        Self::new(short, long)
    }

    pub fn name(&self) -> String {
        format!("SMA({}/{}) crossover", self.short_window, self.long_window)
    }

    pub fn evaluate(
        &self,
        timestamps: &[NaiveDateTime],
        closes: &[f64],
    ) -> Result<PerformanceSummary, CrossoverError> {
        if timestamps.len() != closes.len() {
            return Err(CrossoverError::invalid_parameter(
                "closes",
                format!(
                    "{} closes for {} timestamps",
                    closes.len(),
                    timestamps.len()
                ),
            ));
        }

        // PnL divides by the entry price.
        if let Some((i, close)) = closes
            .iter()
            .enumerate()
            .find(|(_, c)| !(c.is_finite() && **c > 0.0))
        {
            return Err(CrossoverError::invalid_parameter(
                "closes",
                format!("close at index {i} must be a finite positive price, got {close}"),
            ));
        }

        let short_ma = moving_average(closes, self.short_window)?;
        let long_ma = moving_average(closes, self.long_window)?;

        let mut position = Position::Flat;
        let mut trades = Vec::new();

        for (i, (short, long)) in short_ma.iter().zip(&long_ma).enumerate() {
            let (Some(s), Some(l)) = (short, long) else {
                continue;
            };

            let action = match position {
                Position::Flat if s > l => TradeAction::Buy,
                Position::Long if s < l => TradeAction::Sell,
                _ => continue,
            };

            trades.push(TradeEvent {
                timestamp: timestamps[i],
                action,
                price: closes[i],
                index: i,
            });
            position = match action {
                TradeAction::Buy => Position::Long,
                TradeAction::Sell => Position::Flat,
            };
        }

        if position == Position::Long {
            let last = closes.len() - 1;
            trades.push(TradeEvent {
                timestamp: timestamps[last],
                action: TradeAction::Sell,
                price: closes[last],
                index: last,
            });
        }

        Ok(PerformanceSummary::from_trades(self.name(), trades))
    }

    /// Evaluates stored bars, which must already be in ascending time order.
    pub fn evaluate_bars(&self, bars: &[StoredBar]) -> Result<PerformanceSummary, CrossoverError> {
        let timestamps: Vec<NaiveDateTime> = bars.iter().map(|b| b.bar.timestamp).collect();
        let closes: Vec<f64> = bars.iter().map(|b| b.bar.close_f64()).collect();
        self.evaluate(&timestamps, &closes)
    }
}

pub fn compute_signals(
    timestamps: &[NaiveDateTime],
    closes: &[f64],
    short_window: usize,
    long_window: usize,
) -> Result<PerformanceSummary, CrossoverError> {
    SmaCrossover::new(short_window, long_window)?.evaluate(timestamps, closes)
}

/// Converts a signed window length from user input, rejecting non-positive values.
pub fn window_from_i64(name: &str, value: i64) -> Result<usize, CrossoverError> {
    if value <= 0 {
        return Err(CrossoverError::invalid_parameter(
            name,
            format!("window must be > 0, got {value}"),
        ));
    }
    usize::try_from(value)
        .map_err(|_| CrossoverError::invalid_parameter(name, format!("window {value} too large")))
}
