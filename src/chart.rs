//! Translation layer between aggregate data and the chart widgets.
//!
//! Produces plain `{labels, values, colors}` inputs so the rendering side
//! stays swappable, and drives per-point value interpolation itself instead
//! of delegating animation to any widget library.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::warn;

use crate::format::format_currency;
use crate::model::{ChainSummary, TokenSummary};

pub type Rgb = (u8, u8, u8);

/// How many chains the proportion chart shows.
pub const CHAIN_LIMIT: usize = 10;

/// Duration of a value transition after a data update.
pub const ANIMATION: Duration = Duration::from_millis(500);

/// Fixed categorical palette; overflow slots get random HSL colors.
const PALETTE: [Rgb; 20] = [
    (0x3B, 0x82, 0xF6),
    (0x10, 0xB9, 0x81),
    (0xF5, 0x9E, 0x0B),
    (0xEF, 0x44, 0x44),
    (0x8B, 0x5C, 0xF6),
    (0xEC, 0x48, 0x99),
    (0x14, 0xB8, 0xA6),
    (0xF9, 0x73, 0x16),
    (0x63, 0x66, 0xF1),
    (0x84, 0xCC, 0x16),
    (0x06, 0xB6, 0xD4),
    (0xA8, 0x55, 0xF7),
    (0xF4, 0x3F, 0x5E),
    (0x22, 0xC5, 0x5E),
    (0xEA, 0xB3, 0x08),
    (0x78, 0x71, 0x6C),
    (0x08, 0x91, 0xB2),
    (0x7C, 0x3A, 0xED),
    (0xBE, 0x18, 0x5D),
    (0x4F, 0x46, 0xE5),
];

/// Input shape handed to the chart widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Option<Vec<Rgb>>,
}

/// Bar chart input over the top tokens. Empty input is a logged no-op.
pub fn token_chart(tokens: &[TokenSummary], _hidden: bool) -> Option<ChartData> {
    if tokens.is_empty() {
        warn!("no token data provided for chart");
        return None;
    }
    Some(ChartData {
        labels: tokens.iter().map(|t| t.symbol.clone()).collect(),
        values: tokens.iter().map(|t| t.value).collect(),
        colors: None,
    })
}

/// Proportion chart input over the top chains by value, descending. Labels
/// carry the formatted value so they respect the privacy mask.
pub fn chains_chart(chains: &[ChainSummary], hidden: bool) -> Option<ChartData> {
    if chains.is_empty() {
        warn!("no chain data provided for chart");
        return None;
    }

    let mut sorted: Vec<&ChainSummary> = chains.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_value
            .partial_cmp(&a.total_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(CHAIN_LIMIT);

    Some(ChartData {
        labels: sorted
            .iter()
            .map(|chain| format!("{} ({})", chain.name, format_currency(chain.total_value, hidden)))
            .collect(),
        values: sorted.iter().map(|chain| chain.total_value).collect(),
        colors: Some(generate_colors(sorted.len())),
    })
}

pub fn generate_colors(count: usize) -> Vec<Rgb> {
    let mut colors: Vec<Rgb> = PALETTE.iter().copied().take(count).collect();
    let mut rng = rand::thread_rng();
    while colors.len() < count {
        let hue = rng.gen_range(0..360) as f64;
        let saturation = rng.gen_range(70..100) as f64 / 100.0;
        let lightness = rng.gen_range(45..55) as f64 / 100.0;
        colors.push(hsl_to_rgb(hue, saturation, lightness));
    }
    colors
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = lightness - c / 2.0;

    let (r, g, b) = match hue as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

pub fn ease_in_out_quad(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Eased per-point interpolation between the previously displayed values
/// and a new target set. The clock is passed in so tests stay deterministic.
#[derive(Debug, Clone)]
pub struct ChartAnimation {
    from: Vec<f64>,
    to: Vec<f64>,
    started: Instant,
}

impl ChartAnimation {
    /// First data arrival: no transition, values show immediately.
    pub fn new(values: Vec<f64>) -> Self {
        let now = Instant::now();
        ChartAnimation {
            from: values.clone(),
            to: values,
            started: now.checked_sub(ANIMATION).unwrap_or(now),
        }
    }

    /// Starts a transition from whatever is currently displayed toward
    /// `target`. Points that did not change stay still; points appended
    /// beyond the old length snap into place.
    pub fn retarget(&mut self, target: Vec<f64>, now: Instant) {
        let current = self.values_at(now);
        if current == target {
            return;
        }
        let mut from = target.clone();
        for (i, slot) in from.iter_mut().enumerate() {
            if let Some(&displayed) = current.get(i) {
                *slot = displayed;
            }
        }
        self.from = from;
        self.to = target;
        self.started = now;
    }

    pub fn values_at(&self, now: Instant) -> Vec<f64> {
        let elapsed = now.saturating_duration_since(self.started);
        let progress = (elapsed.as_secs_f64() / ANIMATION.as_secs_f64()).min(1.0);
        let eased = ease_in_out_quad(progress);
        self.from
            .iter()
            .zip(&self.to)
            .map(|(from, to)| from + (to - from) * eased)
            .collect()
    }

    pub fn settled(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= ANIMATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(name: &str, value: f64) -> ChainSummary {
        ChainSummary {
            name: name.to_string(),
            total_value: value,
        }
    }

    #[test]
    fn empty_datasets_are_a_no_op() {
        assert!(token_chart(&[], false).is_none());
        assert!(chains_chart(&[], false).is_none());
    }

    #[test]
    fn chains_are_top_ten_descending() {
        let chains: Vec<ChainSummary> =
            (0..15).map(|i| chain(&format!("c{i}"), i as f64)).collect();
        let data = chains_chart(&chains, false).unwrap();

        assert_eq!(data.values.len(), CHAIN_LIMIT);
        assert!(data.values.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(data.values[0], 14.0);
        assert_eq!(data.colors.as_ref().unwrap().len(), CHAIN_LIMIT);
    }

    #[test]
    fn chain_labels_respect_privacy_mask() {
        let data = chains_chart(&[chain("eth", 1234.5)], true).unwrap();
        assert_eq!(data.labels[0], "eth (****)");

        let data = chains_chart(&[chain("eth", 1234.5)], false).unwrap();
        assert_eq!(data.labels[0], "eth ($1,234.50)");
    }

    #[test]
    fn palette_overflow_generates_extra_colors() {
        let colors = generate_colors(25);
        assert_eq!(colors.len(), 25);
        assert_eq!(colors[..20], PALETTE);
    }

    #[test]
    fn easing_hits_both_endpoints() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        assert_eq!(ease_in_out_quad(0.5), 0.5);
        assert!(ease_in_out_quad(0.25) < 0.25);
        assert!(ease_in_out_quad(0.75) > 0.75);
    }

    #[test]
    fn retarget_interpolates_between_values() {
        let start = Instant::now();
        let mut anim = ChartAnimation::new(vec![0.0]);
        anim.retarget(vec![100.0], start);

        assert_eq!(anim.values_at(start), vec![0.0]);
        let midway = anim.values_at(start + ANIMATION / 2)[0];
        assert!(midway > 0.0 && midway < 100.0);
        assert_eq!(anim.values_at(start + ANIMATION), vec![100.0]);
        assert!(anim.settled(start + ANIMATION));
    }

    #[test]
    fn appended_points_snap_into_place() {
        let start = Instant::now();
        let mut anim = ChartAnimation::new(vec![10.0]);
        anim.retarget(vec![10.0, 50.0], start);

        let values = anim.values_at(start);
        assert_eq!(values, vec![10.0, 50.0]);
    }

    #[test]
    fn unchanged_targets_do_not_restart() {
        let start = Instant::now();
        let mut anim = ChartAnimation::new(vec![42.0]);
        let settled_before = anim.settled(start);
        anim.retarget(vec![42.0], start);
        assert_eq!(anim.settled(start), settled_before);
    }
}
