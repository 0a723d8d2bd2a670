// ═══════════════════════════════════════════════════════════════════
// Valuation Tests — ledger reconstruction and vault metrics
// ═══════════════════════════════════════════════════════════════════

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use vault_valuation_core::models::ledger::{LedgerEntry, LedgerEntryKind, ShareState};
use vault_valuation_core::models::performance::FigureSource;
use vault_valuation_core::models::valuation::Reconstruction;
use vault_valuation_core::models::vault::{MetricSource, VaultProfile};
use vault_valuation_core::services::metrics_service::VaultMetricsService;
use vault_valuation_core::services::valuation_service::ValuationReconstructor;

fn t(m: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, m, day, 12, 0, 0).unwrap()
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn reconstruct(entries: &[LedgerEntry], total: f64) -> Reconstruction {
    ValuationReconstructor::new().reconstruct(entries, &ShareState::new(total))
}

mod reconstruction {
    use super::*;

    #[test]
    fn deposit_does_not_move_implied_price() {
        let entries = vec![
            LedgerEntry::valuation(1_000.0, t(1, 1)),
            LedgerEntry::deposit(100.0, 10.0, t(1, 2)),
        ];
        let r = reconstruct(&entries, 110.0);
        assert_eq!(r.rolling_aum, Some(1_100.0));
        assert_eq!(r.implied_price_per_share, Some(10.0));
    }

    #[test]
    fn deposit_and_withdraw_after_anchor() {
        let entries = vec![
            LedgerEntry::valuation(1_000.0, t(1, 1)),
            LedgerEntry::deposit(200.0, 20.0, t(1, 10)),
            LedgerEntry::withdraw(50.0, 5.0, t(1, 15)),
        ];
        let r = reconstruct(&entries, 115.0);
        assert_eq!(r.rolling_aum, Some(1_150.0));
        assert_eq!(r.net_flow_usd, 150.0);
        assert_eq!(r.flow_shares, 15.0);
        assert_eq!(r.shares_at_anchor, Some(100.0));
        assert_eq!(r.implied_price_per_share, Some(10.0));
        assert_eq!(r.anchor_timestamp, Some(t(1, 1)));
    }

    #[test]
    fn no_valuation_means_absent() {
        let entries = vec![
            LedgerEntry::deposit(1_000_000.0, 100_000.0, t(1, 1)),
            LedgerEntry::withdraw(5_000.0, 500.0, t(1, 2)),
        ];
        let r = reconstruct(&entries, 99_500.0);
        assert_eq!(r.rolling_aum, None);
        assert_eq!(r.implied_price_per_share, None);
        assert!(!r.is_anchored());
    }

    #[test]
    fn empty_ledger_means_absent() {
        let r = reconstruct(&[], 100.0);
        assert!(!r.is_anchored());
        assert_eq!(r.implied_price_per_share, None);
    }

    #[test]
    fn only_the_last_valuation_anchors() {
        let entries = vec![
            LedgerEntry::valuation(800.0, t(1, 1)),
            LedgerEntry::deposit(200.0, 25.0, t(1, 5)),
            LedgerEntry::valuation(1_200.0, t(2, 1)),
            LedgerEntry::deposit(120.0, 10.0, t(2, 3)),
        ];
        let r = reconstruct(&entries, 110.0);
        assert_eq!(r.rolling_aum, Some(1_320.0));
        assert_eq!(r.net_flow_usd, 120.0);
        assert_eq!(r.flow_shares, 10.0);
        assert_eq!(r.implied_price_per_share, Some(12.0));
    }

    #[test]
    fn entries_are_sorted_before_scanning() {
        let entries = vec![
            LedgerEntry::deposit(100.0, 10.0, t(1, 2)),
            LedgerEntry::valuation(2_000.0, t(3, 1)),
            LedgerEntry::valuation(1_000.0, t(1, 1)),
        ];
        let r = reconstruct(&entries, 110.0);
        assert_eq!(r.anchor_timestamp, Some(t(3, 1)));
        assert_eq!(r.rolling_aum, Some(2_000.0));
        assert_eq!(r.net_flow_usd, 0.0);
    }

    #[test]
    fn entries_without_timestamp_are_ignored() {
        let mut untimed = LedgerEntry::valuation(5_000.0, t(2, 1));
        untimed.timestamp = None;
        let entries = vec![LedgerEntry::valuation(1_000.0, t(1, 1)), untimed];

        let r = reconstruct(&entries, 100.0);
        assert_eq!(r.rolling_aum, Some(1_000.0));
        assert_eq!(r.implied_price_per_share, Some(10.0));
    }

    #[test]
    fn equal_timestamps_keep_arrival_order() {
        let entries = vec![
            LedgerEntry::deposit(100.0, 10.0, t(1, 1)),
            LedgerEntry::valuation(1_000.0, t(1, 1)),
        ];

        // The deposit arrived before the mark, so the mark already includes it.
        let r = reconstruct(&entries, 100.0);
        assert_eq!(r.rolling_aum, Some(1_000.0));
        assert_eq!(r.net_flow_usd, 0.0);
    }

    #[test]
    fn null_flow_amounts_from_json_count_as_zero() {
        let json = r#"[
            {"id": "6f1c2a64-3f7e-4a8e-9d43-0f0e5c1d2b3a", "timestamp": "2025-01-01T12:00:00Z", "type": "Valuation", "aum_usd": 1000.0},
            {"id": "0b6d4c1e-8a2f-4e3b-9c5d-7e1f2a3b4c5d", "timestamp": "2025-01-02T12:00:00Z", "type": "Deposit", "amount_usd": null, "shares": 10.0},
            {"id": "1c7e5d2f-9b3a-4f4c-8d6e-8f2a3b4c5d6e", "timestamp": "2025-01-03T12:00:00Z", "type": "Deposit", "amount_usd": 200.0, "shares": 20.0}
        ]"#;
        let entries: Vec<LedgerEntry> = serde_json::from_str(json).unwrap();

        let r = reconstruct(&entries, 130.0);
        assert_eq!(r.rolling_aum, Some(1_200.0));
        assert_eq!(r.flow_shares, 30.0);
        assert_eq!(r.shares_at_anchor, Some(100.0));
        assert_eq!(r.implied_price_per_share, Some(1_200.0 / 130.0));
    }

    #[test]
    fn non_finite_anchor_means_absent() {
        let entries = vec![
            LedgerEntry::valuation(1_000.0, t(1, 1)),
            LedgerEntry::valuation(f64::NAN, t(1, 2)),
            LedgerEntry::deposit(100.0, 10.0, t(1, 3)),
        ];
        let r = reconstruct(&entries, 110.0);
        assert_eq!(r.rolling_aum, None);
        assert_eq!(r.implied_price_per_share, None);
    }

    #[test]
    fn non_finite_flows_count_as_zero() {
        let entries = vec![
            LedgerEntry::valuation(1_000.0, t(1, 1)),
            LedgerEntry::deposit(f64::NAN, 10.0, t(1, 2)),
            LedgerEntry::new(
                LedgerEntryKind::Withdraw { amount_usd: 50.0, shares: f64::INFINITY },
                t(1, 3),
            ),
        ];
        let r = reconstruct(&entries, 110.0);
        assert_eq!(r.rolling_aum, Some(950.0));
        assert_eq!(r.flow_shares, 10.0);
        assert_eq!(r.shares_at_anchor, Some(100.0));
    }

    #[test]
    fn inconsistent_share_count_hides_price_but_keeps_aum() {
        let entries = vec![
            LedgerEntry::valuation(1_000.0, t(1, 1)),
            LedgerEntry::deposit(500.0, 50.0, t(1, 2)),
        ];
        // 40 outstanding but 50 issued since the anchor.
        let r = reconstruct(&entries, 40.0);
        assert_eq!(r.rolling_aum, Some(1_500.0));
        assert_eq!(r.shares_at_anchor, Some(-10.0));
        assert_eq!(r.implied_price_per_share, None);
    }

    #[test]
    fn unknown_share_count_hides_price() {
        let entries = vec![LedgerEntry::valuation(1_000.0, t(1, 1))];
        let r = ValuationReconstructor::new().reconstruct(&entries, &ShareState::unknown());
        assert_eq!(r.rolling_aum, Some(1_000.0));
        assert_eq!(r.implied_price_per_share, None);
        assert_eq!(r.shares_at_anchor, None);

        let r = ValuationReconstructor::new()
            .reconstruct(&entries, &ShareState { total_shares_outstanding: Some(f64::NAN) });
        assert_eq!(r.implied_price_per_share, None);
    }

    #[test]
    fn ledger_is_left_untouched() {
        let entries = vec![
            LedgerEntry::deposit(100.0, 10.0, t(1, 2)),
            LedgerEntry::valuation(1_000.0, t(1, 1)),
        ];
        let before = entries.clone();
        reconstruct(&entries, 110.0);
        assert_eq!(entries, before);
    }
}

mod vault_metrics {
    use super::*;

    fn profile() -> VaultProfile {
        VaultProfile::new("vault-1", d(2024, 1, 1), 8.0)
    }

    #[test]
    fn derived_values_win() {
        let entries = vec![
            LedgerEntry::valuation(1_000.0, t(1, 1)),
            LedgerEntry::deposit(200.0, 20.0, t(1, 10)),
            LedgerEntry::withdraw(50.0, 5.0, t(1, 15)),
        ];
        let p = profile().with_configured(Some(999.0), Some(9.0));
        let m = VaultMetricsService::default().vault_metrics(
            &p,
            &entries,
            &ShareState::new(115.0),
            d(2025, 1, 1),
        );

        assert_eq!(m.aum, Some(1_150.0));
        assert_eq!(m.aum_source, MetricSource::Derived);
        assert_eq!(m.price_per_share, Some(10.0));
        assert_eq!(m.price_source, MetricSource::Derived);
        // 8 → 10 is +25% over 366 days.
        assert!((m.performance.total_return_percent - 25.0).abs() < 1e-9);
        assert_eq!(m.performance.days_elapsed, 366);
        assert!(m.performance.annualized_percent < 25.0);
        assert!(m.performance.annualized_percent > 24.0);
    }

    #[test]
    fn configured_values_fill_gaps() {
        let entries = vec![LedgerEntry::deposit(200.0, 20.0, t(1, 10))];
        let p = profile().with_configured(Some(5_000.0), Some(8.8));
        let m = VaultMetricsService::default().vault_metrics(
            &p,
            &entries,
            &ShareState::new(500.0),
            d(2024, 1, 11),
        );

        assert_eq!(m.aum, Some(5_000.0));
        assert_eq!(m.aum_source, MetricSource::Configured);
        assert_eq!(m.price_per_share, Some(8.8));
        assert_eq!(m.price_source, MetricSource::Configured);
        // 10 days: not annualized.
        assert_eq!(m.performance.annualized_percent, m.performance.total_return_percent);
    }

    #[test]
    fn nothing_available_reports_zero_performance() {
        let m = VaultMetricsService::default().vault_metrics(
            &profile(),
            &[],
            &ShareState::unknown(),
            d(2025, 1, 1),
        );

        assert_eq!(m.aum, None);
        assert_eq!(m.aum_source, MetricSource::Unavailable);
        assert_eq!(m.price_source, MetricSource::Unavailable);
        assert_eq!(m.performance.total_return_percent, 0.0);
        assert_eq!(m.performance.annualized_percent, 0.0);
    }

    #[test]
    fn server_figures_take_precedence() {
        let entries = vec![LedgerEntry::valuation(1_000.0, t(1, 1))];
        let p = profile().with_server_figures(Some(12.5), None);
        let m = VaultMetricsService::default().vault_metrics(
            &p,
            &entries,
            &ShareState::new(100.0),
            d(2025, 1, 1),
        );

        assert_eq!(m.performance.total_return_percent, 12.5);
        assert_eq!(m.performance.return_source, FigureSource::Server);
        assert_eq!(m.performance.annualized_source, FigureSource::Local);
    }
}
