//! # Tariff Resolver
//!
//! Selects the price that applies to a zone at a given instant.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  now ─────────────────────────────────────────────────────────────────► │
//! │                                                                         │
//! │  presale  [valid_from ────── valid_until)                               │
//! │  normal                       [valid_from ──────────── valid_until)     │
//! │                                                                         │
//! │  1. A presale tariff whose window contains `now` wins.                  │
//! │  2. Otherwise the normal tariff applies (window ignored), preferring    │
//! │     one whose window contains `now`, then the earliest-starting one.    │
//! │  3. No presale in window and no normal tariff → not on sale.            │
//! │                                                                         │
//! │  Windows are half-open and compared at full timestamp precision.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{ActivePrice, Tariff, TariffKind};

/// True when `now` lies in `[valid_from, valid_until)`.
#[inline]
pub fn is_within_window(tariff: &Tariff, now: DateTime<Utc>) -> bool {
    tariff.valid_from <= now && now < tariff.valid_until
}

/// Resolves the active price for one zone's tariffs.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use taquilla_core::tariff::resolve_active_price;
/// use taquilla_core::{Tariff, TariffKind};
///
/// let now = Utc::now();
/// let tariffs = vec![
///     Tariff {
///         id: "n".into(), zone_id: "z".into(), kind: TariffKind::Normal,
///         price_cents: 10000,
///         valid_from: now - Duration::days(1), valid_until: now + Duration::days(30),
///     },
///     Tariff {
///         id: "p".into(), zone_id: "z".into(), kind: TariffKind::Presale,
///         price_cents: 8000,
///         valid_from: now - Duration::hours(1), valid_until: now + Duration::hours(1),
///     },
/// ];
///
/// let active = resolve_active_price(&tariffs, now).unwrap();
/// assert_eq!(active.kind, TariffKind::Presale);
/// assert_eq!(active.price.cents(), 8000);
/// ```
pub fn resolve_active_price(tariffs: &[Tariff], now: DateTime<Utc>) -> Option<ActivePrice> {
    let presale = tariffs
        .iter()
        .filter(|t| t.kind == TariffKind::Presale && is_within_window(t, now))
        .min_by_key(|t| t.valid_from);

    if let Some(tariff) = presale {
        return Some(ActivePrice {
            kind: TariffKind::Presale,
            price: tariff.price(),
        });
    }

    let mut normals: Vec<&Tariff> = tariffs
        .iter()
        .filter(|t| t.kind == TariffKind::Normal)
        .collect();
    normals.sort_by_key(|t| t.valid_from);

    normals
        .iter()
        .find(|t| is_within_window(t, now))
        .or_else(|| normals.first())
        .map(|t| ActivePrice {
            kind: TariffKind::Normal,
            price: t.price(),
        })
}

/// Minimum displayable price across zones, each resolved independently.
///
/// Zones with no active price are skipped; `None` when no zone is on sale.
pub fn min_active_price<'a, I>(zone_tariffs: I, now: DateTime<Utc>) -> Option<Money>
where
    I: IntoIterator<Item = &'a [Tariff]>,
{
    zone_tariffs
        .into_iter()
        .filter_map(|tariffs| resolve_active_price(tariffs, now))
        .map(|active| active.price)
        .min()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, h, 0, 0).unwrap()
    }

    fn tariff(kind: TariffKind, price: i64, from: DateTime<Utc>, until: DateTime<Utc>) -> Tariff {
        Tariff {
            id: format!("{:?}-{}", kind, price),
            zone_id: "z".into(),
            kind,
            price_cents: price,
            valid_from: from,
            valid_until: until,
        }
    }

    #[test]
    fn test_presale_wins_inside_window() {
        let tariffs = vec![
            tariff(TariffKind::Normal, 10000, at(0), at(23)),
            tariff(TariffKind::Presale, 7000, at(8), at(12)),
        ];
        let active = resolve_active_price(&tariffs, at(9)).unwrap();
        assert_eq!(active.kind, TariffKind::Presale);
        assert_eq!(active.price.cents(), 7000);
    }

    #[test]
    fn test_normal_outside_presale_window() {
        let tariffs = vec![
            tariff(TariffKind::Normal, 10000, at(0), at(23)),
            tariff(TariffKind::Presale, 7000, at(8), at(12)),
        ];
        assert_eq!(
            resolve_active_price(&tariffs, at(7)).unwrap().kind,
            TariffKind::Normal
        );
        assert_eq!(
            resolve_active_price(&tariffs, at(13)).unwrap().kind,
            TariffKind::Normal
        );
    }

    #[test]
    fn test_window_is_half_open() {
        let tariffs = vec![
            tariff(TariffKind::Normal, 10000, at(0), at(23)),
            tariff(TariffKind::Presale, 7000, at(8), at(12)),
        ];
        assert_eq!(
            resolve_active_price(&tariffs, at(8)).unwrap().kind,
            TariffKind::Presale
        );
        assert_eq!(
            resolve_active_price(&tariffs, at(12)).unwrap().kind,
            TariffKind::Normal
        );
        let just_before_end = at(12) - Duration::milliseconds(1);
        assert_eq!(
            resolve_active_price(&tariffs, just_before_end).unwrap().kind,
            TariffKind::Presale
        );
    }

    #[test]
    fn test_normal_applies_outside_its_own_window() {
        let tariffs = vec![tariff(TariffKind::Normal, 10000, at(10), at(11))];
        let active = resolve_active_price(&tariffs, at(20)).unwrap();
        assert_eq!(active.price.cents(), 10000);
    }

    #[test]
    fn test_in_window_normal_preferred() {
        let tariffs = vec![
            tariff(TariffKind::Normal, 9000, at(0), at(10)),
            tariff(TariffKind::Normal, 12000, at(10), at(23)),
        ];
        assert_eq!(
            resolve_active_price(&tariffs, at(15)).unwrap().price.cents(),
            12000
        );
        // Before any window: earliest-starting normal tariff
        let early = at(0) - Duration::hours(1);
        assert_eq!(
            resolve_active_price(&tariffs, early).unwrap().price.cents(),
            9000
        );
    }

    #[test]
    fn test_presale_only_zone_off_window_has_no_price() {
        let tariffs = vec![tariff(TariffKind::Presale, 7000, at(8), at(12))];
        assert!(resolve_active_price(&tariffs, at(13)).is_none());
        assert!(resolve_active_price(&[], at(13)).is_none());
    }

    #[test]
    fn test_min_active_price_per_zone() {
        let vip = vec![
            tariff(TariffKind::Normal, 30000, at(0), at(23)),
            tariff(TariffKind::Presale, 25000, at(8), at(12)),
        ];
        let general = vec![tariff(TariffKind::Normal, 26000, at(0), at(23))];
        let closed: Vec<Tariff> = vec![];

        let zones = [vip.as_slice(), general.as_slice(), closed.as_slice()];
        assert_eq!(min_active_price(zones, at(9)).unwrap().cents(), 25000);
        assert_eq!(min_active_price(zones, at(13)).unwrap().cents(), 26000);
        assert!(min_active_price([closed.as_slice()], at(9)).is_none());
    }
}
