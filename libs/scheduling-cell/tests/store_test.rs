use assert_matches::assert_matches;
use chrono::NaiveTime;
use uuid::Uuid;

use scheduling_cell::models::{
    CreateHolidayRequest, CreateRuleRequest, CreateScheduleTypeRequest, DayOfWeek, HolidayDate,
    ProtocolService, RuleException, ScheduleTypeKind, ScheduleView, SchedulingError,
    UpsertConfigRequest,
};
use scheduling_cell::SchedulingStore;

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn config_request() -> UpsertConfigRequest {
    UpsertConfigRequest {
        default_view: ScheduleView::Week,
        block_interval_minutes: 30,
        working_days: vec![DayOfWeek::Monday, DayOfWeek::Tuesday],
        start_time: time(8, 0),
        end_time: time(18, 0),
        default_type_name: "Consultation".to_string(),
    }
}

fn rule_request(professional_id: Uuid, unit_id: Uuid, days: Vec<DayOfWeek>) -> CreateRuleRequest {
    CreateRuleRequest {
        professional_id,
        unit_id,
        days_of_week: days,
        start_time: time(9, 0),
        end_time: time(12, 0),
        exceptions: vec![],
    }
}

#[test]
fn config_upsert_replaces_previous_config() {
    let store = SchedulingStore::new();
    let unit_id = Uuid::new_v4();

    store.upsert_config(unit_id, config_request()).unwrap();
    let mut second = config_request();
    second.block_interval_minutes = 60;
    store.upsert_config(unit_id, second).unwrap();

    let effective = store.config_for_unit(unit_id).unwrap();
    assert_eq!(effective.block_interval_minutes, 60);
}

#[test]
fn config_rejects_inverted_window_and_bad_block() {
    let store = SchedulingStore::new();
    let unit_id = Uuid::new_v4();

    let mut inverted = config_request();
    inverted.start_time = time(18, 0);
    inverted.end_time = time(8, 0);
    assert_matches!(
        store.upsert_config(unit_id, inverted),
        Err(SchedulingError::InvalidInterval(_))
    );

    let mut zero_block = config_request();
    zero_block.block_interval_minutes = 0;
    assert_matches!(
        store.upsert_config(unit_id, zero_block),
        Err(SchedulingError::InvalidInterval(_))
    );

    // 8:00-18:00 is 600 minutes; 25 does not divide it evenly.
    let mut uneven = config_request();
    uneven.block_interval_minutes = 25;
    assert_matches!(
        store.upsert_config(unit_id, uneven),
        Err(SchedulingError::InvalidInterval(_))
    );
}

#[test]
fn rule_requires_existing_config() {
    let store = SchedulingStore::new();
    let unit_id = Uuid::new_v4();

    assert_matches!(
        store.create_rule(rule_request(Uuid::new_v4(), unit_id, vec![DayOfWeek::Monday])),
        Err(SchedulingError::ConfigMissing(id)) if id == unit_id
    );
}

#[test]
fn overlapping_rules_for_same_professional_and_day_are_rejected() {
    let store = SchedulingStore::new();
    let unit_id = Uuid::new_v4();
    let professional_id = Uuid::new_v4();
    store.upsert_config(unit_id, config_request()).unwrap();

    store
        .create_rule(rule_request(professional_id, unit_id, vec![DayOfWeek::Monday]))
        .unwrap();

    // 11:00-14:00 overlaps the stored 9:00-12:00 window on Monday.
    let mut overlapping = rule_request(professional_id, unit_id, vec![DayOfWeek::Monday]);
    overlapping.start_time = time(11, 0);
    overlapping.end_time = time(14, 0);
    assert_matches!(
        store.create_rule(overlapping),
        Err(SchedulingError::RuleOverlap(_))
    );
}

#[test]
fn non_conflicting_rules_are_accepted() {
    let store = SchedulingStore::new();
    let unit_id = Uuid::new_v4();
    let professional_id = Uuid::new_v4();
    store.upsert_config(unit_id, config_request()).unwrap();

    store
        .create_rule(rule_request(professional_id, unit_id, vec![DayOfWeek::Monday]))
        .unwrap();

    // Same times on a different day.
    store
        .create_rule(rule_request(professional_id, unit_id, vec![DayOfWeek::Tuesday]))
        .unwrap();

    // Same day, adjacent window.
    let mut afternoon = rule_request(professional_id, unit_id, vec![DayOfWeek::Monday]);
    afternoon.start_time = time(12, 0);
    afternoon.end_time = time(15, 0);
    store.create_rule(afternoon).unwrap();

    // Same day and window, different professional.
    store
        .create_rule(rule_request(Uuid::new_v4(), unit_id, vec![DayOfWeek::Monday]))
        .unwrap();
}

#[test]
fn rule_must_stay_inside_the_unit_window() {
    let store = SchedulingStore::new();
    let unit_id = Uuid::new_v4();
    store.upsert_config(unit_id, config_request()).unwrap();

    let mut wide = rule_request(Uuid::new_v4(), unit_id, vec![DayOfWeek::Monday]);
    wide.start_time = time(7, 0);
    assert_matches!(
        store.create_rule(wide),
        Err(SchedulingError::InvalidInterval(_))
    );
}

#[test]
fn rule_exceptions_are_validated() {
    let store = SchedulingStore::new();
    let unit_id = Uuid::new_v4();
    store.upsert_config(unit_id, config_request()).unwrap();

    let mut inverted = rule_request(Uuid::new_v4(), unit_id, vec![DayOfWeek::Monday]);
    inverted.exceptions = vec![RuleException {
        start_time: time(11, 0),
        end_time: time(10, 0),
    }];
    assert_matches!(
        store.create_rule(inverted),
        Err(SchedulingError::InvalidInterval(_))
    );

    let mut outside = rule_request(Uuid::new_v4(), unit_id, vec![DayOfWeek::Monday]);
    outside.exceptions = vec![RuleException {
        start_time: time(12, 0),
        end_time: time(13, 0),
    }];
    assert_matches!(
        store.create_rule(outside),
        Err(SchedulingError::InvalidInterval(_))
    );
}

#[test]
fn holiday_day_and_month_are_range_checked() {
    let store = SchedulingStore::new();

    assert_matches!(
        store.create_holiday(CreateHolidayRequest {
            name: "Bad month".to_string(),
            date: HolidayDate::Recurring { day: 1, month: 13 },
        }),
        Err(SchedulingError::InvalidInterval(_))
    );

    store
        .create_holiday(CreateHolidayRequest {
            name: "New year".to_string(),
            date: HolidayDate::Recurring { day: 1, month: 1 },
        })
        .unwrap();
    assert_eq!(store.holidays().len(), 1);
}

#[test]
fn interval_control_service_needs_a_positive_gap() {
    let store = SchedulingStore::new();

    let request = CreateScheduleTypeRequest {
        name: "Protocol".to_string(),
        duration_minutes: 30,
        kind: ScheduleTypeKind::Protocol {
            services: vec![ProtocolService {
                id: Uuid::new_v4(),
                name: "Laser".to_string(),
                number_of_sessions: 10,
                default_duration_minutes: 30,
                requires_scheduling: true,
                requires_interval_control: true,
                min_interval_days: None,
            }],
        },
    };
    assert_matches!(
        store.create_schedule_type(request),
        Err(SchedulingError::InvalidInterval(_))
    );
}

#[test]
fn delete_reports_missing_rows() {
    let store = SchedulingStore::new();
    assert!(!store.delete_rule(Uuid::new_v4()));
    assert!(!store.delete_holiday(Uuid::new_v4()));
}
