//! Derived metric calculator
//!
//! Pure, deterministic recomputation of all derived entries (BMI, lean body
//! mass, fat mass, fat-free mass index, basal metabolic rate, body surface
//! area) from the raw weight, height, and body-fat history.
//!
//! Recomputation is wholesale rather than incremental: a historical edit or
//! delete of a height or body-fat entry can retroactively change which
//! reference value is "most recent as of" an earlier weight date, and the
//! dataset is a single user's bounded personal history.

use std::collections::BTreeMap;

use bodylog_domain::{EntrySource, MeasurementEntry, MeasurementType};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// BMR (Katch-McArdle) constants
const BMR_BASE: f64 = 370.0;
const BMR_LBM_FACTOR: f64 = 21.6;

/// Recompute every derived entry from the raw entries in `entries`.
///
/// Existing derived entries in the input are ignored; the return value is
/// the complete replacement set. Derived entries are stamped
/// `source = Derived` and dated identically to the triggering weight entry.
/// When two weight entries share a calendar day the later one wins, so the
/// one-entry-per-(day, kind, source) invariant holds on the output.
pub fn recompute_derived(entries: &[MeasurementEntry]) -> Vec<MeasurementEntry> {
    let weights = sorted_raw(entries, MeasurementType::Weight);
    let heights = sorted_raw(entries, MeasurementType::Height);
    let body_fats = sorted_raw(entries, MeasurementType::BodyFat);

    let mut out: BTreeMap<(NaiveDate, &'static str), MeasurementEntry> = BTreeMap::new();

    for weight in weights {
        let Some(height) = latest_at(&heights, weight.date) else {
            continue;
        };

        let height_cm = height.value;
        let height_m = height_cm / 100.0;
        if height_m <= 0.0 {
            continue;
        }

        let kg = weight.value;

        push(&mut out, weight, MeasurementType::Bmi, kg / (height_m * height_m));
        push(
            &mut out,
            weight,
            MeasurementType::BodySurfaceArea,
            ((height_cm * kg) / 3600.0).sqrt(),
        );

        if let Some(body_fat) = latest_at(&body_fats, weight.date) {
            let fraction = body_fat.value / 100.0;
            let lbm = kg * (1.0 - fraction);

            push(&mut out, weight, MeasurementType::LeanBodyMass, lbm);
            push(&mut out, weight, MeasurementType::FatMass, kg * fraction);
            push(&mut out, weight, MeasurementType::FatFreeMassIndex, lbm / (height_m * height_m));
            push(&mut out, weight, MeasurementType::BasalMetabolicRate, BMR_BASE + BMR_LBM_FACTOR * lbm);
        }
    }

    out.into_values().collect()
}

/// Raw entries of `kind` sorted by date ascending.
fn sorted_raw(entries: &[MeasurementEntry], kind: MeasurementType) -> Vec<&MeasurementEntry> {
    let mut matching: Vec<&MeasurementEntry> = entries
        .iter()
        .filter(|e| e.kind == kind && e.source != EntrySource::Derived)
        .collect();
    matching.sort_by_key(|e| e.date);
    matching
}

/// Most recent entry with `date <= as_of`, assuming ascending input.
fn latest_at<'a>(
    sorted: &[&'a MeasurementEntry],
    as_of: DateTime<Utc>,
) -> Option<&'a MeasurementEntry> {
    sorted.iter().rev().find(|e| e.date <= as_of).copied()
}

fn push(
    out: &mut BTreeMap<(NaiveDate, &'static str), MeasurementEntry>,
    weight: &MeasurementEntry,
    kind: MeasurementType,
    value: f64,
) {
    let entry = MeasurementEntry {
        id: Uuid::now_v7(),
        date: weight.date,
        value,
        kind,
        source: EntrySource::Derived,
        backend_id: None,
    };
    out.insert((weight.day(), kind.as_str()), entry);
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn raw(kind: MeasurementType, day: u32, value: f64) -> MeasurementEntry {
        let date = Utc.with_ymd_and_hms(2024, 1, day, 8, 0, 0).unwrap();
        MeasurementEntry::new(kind, date, value, EntrySource::Manual)
    }

    fn find(derived: &[MeasurementEntry], kind: MeasurementType, day: u32) -> Option<f64> {
        derived
            .iter()
            .find(|e| e.kind == kind && e.day() == chrono::NaiveDate::from_ymd_opt(2024, 1, day).unwrap())
            .map(|e| e.value)
    }

    #[test]
    fn bmi_from_weight_and_height_on_same_day() {
        let entries = vec![raw(MeasurementType::Weight, 1, 80.0), raw(MeasurementType::Height, 1, 180.0)];
        let derived = recompute_derived(&entries);

        let bmi = find(&derived, MeasurementType::Bmi, 1).unwrap();
        assert!((bmi - 80.0 / (1.8 * 1.8)).abs() < 1e-9);
        assert!((bmi - 24.69).abs() < 0.01);
    }

    #[test]
    fn height_reference_is_most_recent_as_of_weight_date() {
        // Height recorded before the weight applies; a later height does not.
        let entries = vec![
            raw(MeasurementType::Height, 5, 170.0),
            raw(MeasurementType::Weight, 10, 75.0),
            raw(MeasurementType::Height, 15, 180.0),
        ];
        let derived = recompute_derived(&entries);

        let bmi = find(&derived, MeasurementType::Bmi, 10).unwrap();
        assert!((bmi - 75.0 / (1.7 * 1.7)).abs() < 1e-9);
        assert!((bmi - 25.95).abs() < 0.01);
    }

    #[test]
    fn no_height_means_no_derived_entries() {
        let entries = vec![raw(MeasurementType::Weight, 10, 75.0)];
        assert!(recompute_derived(&entries).is_empty());
    }

    #[test]
    fn body_fat_cascade_produces_composition_metrics() {
        let entries = vec![
            raw(MeasurementType::Weight, 10, 80.0),
            raw(MeasurementType::Height, 1, 180.0),
            raw(MeasurementType::BodyFat, 5, 25.0),
        ];
        let derived = recompute_derived(&entries);

        let lbm = find(&derived, MeasurementType::LeanBodyMass, 10).unwrap();
        let fm = find(&derived, MeasurementType::FatMass, 10).unwrap();
        let ffmi = find(&derived, MeasurementType::FatFreeMassIndex, 10).unwrap();
        let bmr = find(&derived, MeasurementType::BasalMetabolicRate, 10).unwrap();

        assert!((lbm - 60.0).abs() < 1e-9);
        assert!((fm - 20.0).abs() < 1e-9);
        assert!((ffmi - 60.0 / (1.8 * 1.8)).abs() < 1e-9);
        assert!((bmr - (370.0 + 21.6 * 60.0)).abs() < 1e-9);
    }

    #[test]
    fn bsa_does_not_require_body_fat() {
        let entries = vec![raw(MeasurementType::Weight, 10, 80.0), raw(MeasurementType::Height, 1, 180.0)];
        let derived = recompute_derived(&entries);

        let bsa = find(&derived, MeasurementType::BodySurfaceArea, 10).unwrap();
        assert!((bsa - ((180.0_f64 * 80.0) / 3600.0).sqrt()).abs() < 1e-9);
        assert!(find(&derived, MeasurementType::LeanBodyMass, 10).is_none());
    }

    #[test]
    fn removing_height_removes_dependent_bmi() {
        let mut entries =
            vec![raw(MeasurementType::Weight, 1, 80.0), raw(MeasurementType::Height, 1, 180.0)];
        assert!(find(&recompute_derived(&entries), MeasurementType::Bmi, 1).is_some());

        entries.retain(|e| e.kind != MeasurementType::Height);
        assert!(recompute_derived(&entries).is_empty());
    }

    #[test]
    fn same_day_weights_yield_single_derived_set() {
        // Manual and provider weights on the same day: last one by date wins.
        let date_a = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let date_b = Utc.with_ymd_and_hms(2024, 1, 10, 20, 0, 0).unwrap();
        let entries = vec![
            MeasurementEntry::new(MeasurementType::Weight, date_a, 80.0, EntrySource::Manual),
            MeasurementEntry::new(MeasurementType::Weight, date_b, 82.0, EntrySource::Provider),
            raw(MeasurementType::Height, 1, 180.0),
        ];

        let derived = recompute_derived(&entries);
        let bmis: Vec<_> = derived.iter().filter(|e| e.kind == MeasurementType::Bmi).collect();
        assert_eq!(bmis.len(), 1);
        assert!((bmis[0].value - 82.0 / (1.8 * 1.8)).abs() < 1e-9);
    }

    #[test]
    fn stale_derived_input_is_discarded() {
        let date = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let stale = MeasurementEntry::new(MeasurementType::Bmi, date, 99.0, EntrySource::Derived);
        let derived = recompute_derived(&[stale]);
        assert!(derived.is_empty());
    }
}
