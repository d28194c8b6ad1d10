// libs/scheduling-cell/src/store.rs
//
// In-memory repository for the configuration entities administrators edit
// out-of-band: schedule configs, rules, holidays and types. All invariants
// are enforced here at write time, so configuration errors never reach the
// booking hot path.

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    CreateHolidayRequest, CreateRuleRequest, CreateScheduleTypeRequest, HolidayDate,
    ScheduleConfig, ScheduleHoliday, ScheduleRule, ScheduleType, ScheduleTypeKind,
    SchedulingError, UpsertConfigRequest,
};
use crate::services::availability;

#[derive(Default)]
pub struct SchedulingStore {
    configs: RwLock<HashMap<Uuid, ScheduleConfig>>,
    rules: RwLock<Vec<ScheduleRule>>,
    holidays: RwLock<Vec<ScheduleHoliday>>,
    types: RwLock<HashMap<Uuid, ScheduleType>>,
}

impl SchedulingStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // SCHEDULE CONFIG
    // ==========================================================================

    /// Create or replace the unit's config. Exactly one effective config per
    /// unit.
    pub fn upsert_config(
        &self,
        unit_id: Uuid,
        request: UpsertConfigRequest,
    ) -> Result<ScheduleConfig, SchedulingError> {
        if request.start_time >= request.end_time {
            return Err(SchedulingError::InvalidInterval(format!(
                "config start {} must be before end {}",
                request.start_time, request.end_time
            )));
        }
        if request.block_interval_minutes <= 0 {
            return Err(SchedulingError::InvalidInterval(format!(
                "block interval must be positive, got {}",
                request.block_interval_minutes
            )));
        }
        let window_minutes =
            (request.end_time - request.start_time).num_minutes();
        if window_minutes % request.block_interval_minutes != 0 {
            return Err(SchedulingError::InvalidInterval(format!(
                "block interval {} does not divide the {}-minute working day evenly",
                request.block_interval_minutes, window_minutes
            )));
        }

        let config = ScheduleConfig {
            id: Uuid::new_v4(),
            unit_id,
            default_view: request.default_view,
            block_interval_minutes: request.block_interval_minutes,
            working_days: request.working_days,
            start_time: request.start_time,
            end_time: request.end_time,
            default_type_name: request.default_type_name,
        };

        let mut configs = self.configs.write().unwrap_or_else(|e| e.into_inner());
        configs.insert(unit_id, config.clone());
        debug!("schedule config stored for unit {}", unit_id);
        Ok(config)
    }

    pub fn config_for_unit(&self, unit_id: Uuid) -> Option<ScheduleConfig> {
        let configs = self.configs.read().unwrap_or_else(|e| e.into_inner());
        configs.get(&unit_id).cloned()
    }

    // ==========================================================================
    // SCHEDULE RULES
    // ==========================================================================

    pub fn create_rule(
        &self,
        request: CreateRuleRequest,
    ) -> Result<ScheduleRule, SchedulingError> {
        let config = self
            .config_for_unit(request.unit_id)
            .ok_or(SchedulingError::ConfigMissing(request.unit_id))?;

        let rule = ScheduleRule {
            id: Uuid::new_v4(),
            professional_id: request.professional_id,
            unit_id: request.unit_id,
            days_of_week: request.days_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            exceptions: request.exceptions,
        };

        let mut rules = self.rules.write().unwrap_or_else(|e| e.into_inner());
        availability::validate_rule(&rule, &rules, &config)?;
        rules.push(rule.clone());
        debug!(
            "schedule rule {} stored for professional {}",
            rule.id, rule.professional_id
        );
        Ok(rule)
    }

    pub fn rules_for(&self, professional_id: Uuid, unit_id: Uuid) -> Vec<ScheduleRule> {
        let rules = self.rules.read().unwrap_or_else(|e| e.into_inner());
        rules
            .iter()
            .filter(|rule| rule.professional_id == professional_id && rule.unit_id == unit_id)
            .cloned()
            .collect()
    }

    pub fn list_rules(&self) -> Vec<ScheduleRule> {
        let rules = self.rules.read().unwrap_or_else(|e| e.into_inner());
        rules.clone()
    }

    pub fn delete_rule(&self, rule_id: Uuid) -> bool {
        let mut rules = self.rules.write().unwrap_or_else(|e| e.into_inner());
        let before = rules.len();
        rules.retain(|rule| rule.id != rule_id);
        rules.len() != before
    }

    // ==========================================================================
    // HOLIDAYS
    // ==========================================================================

    pub fn create_holiday(
        &self,
        request: CreateHolidayRequest,
    ) -> Result<ScheduleHoliday, SchedulingError> {
        let (day, month) = match request.date {
            HolidayDate::Recurring { day, month } => (day, month),
            HolidayDate::Specific { day, month, .. } => (day, month),
        };
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return Err(SchedulingError::InvalidInterval(format!(
                "holiday day/month out of range: {}/{}",
                day, month
            )));
        }

        let holiday = ScheduleHoliday {
            id: Uuid::new_v4(),
            name: request.name,
            date: request.date,
        };
        let mut holidays = self.holidays.write().unwrap_or_else(|e| e.into_inner());
        holidays.push(holiday.clone());
        Ok(holiday)
    }

    pub fn holidays(&self) -> Vec<ScheduleHoliday> {
        let holidays = self.holidays.read().unwrap_or_else(|e| e.into_inner());
        holidays.clone()
    }

    pub fn delete_holiday(&self, holiday_id: Uuid) -> bool {
        let mut holidays = self.holidays.write().unwrap_or_else(|e| e.into_inner());
        let before = holidays.len();
        holidays.retain(|holiday| holiday.id != holiday_id);
        holidays.len() != before
    }

    // ==========================================================================
    // SCHEDULE TYPES
    // ==========================================================================

    pub fn create_schedule_type(
        &self,
        request: CreateScheduleTypeRequest,
    ) -> Result<ScheduleType, SchedulingError> {
        if request.duration_minutes <= 0 {
            return Err(SchedulingError::InvalidInterval(format!(
                "type duration must be positive, got {}",
                request.duration_minutes
            )));
        }
        if let ScheduleTypeKind::Protocol { services } = &request.kind {
            for service in services {
                if service.default_duration_minutes <= 0 {
                    return Err(SchedulingError::InvalidInterval(format!(
                        "service {} duration must be positive",
                        service.name
                    )));
                }
                if service.requires_interval_control
                    && service.min_interval_days.map_or(true, |days| days <= 0)
                {
                    return Err(SchedulingError::InvalidInterval(format!(
                        "service {} requires interval control but has no positive minimum gap",
                        service.name
                    )));
                }
            }
        }

        let schedule_type = ScheduleType {
            id: Uuid::new_v4(),
            name: request.name,
            duration_minutes: request.duration_minutes,
            kind: request.kind,
        };
        let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());
        types.insert(schedule_type.id, schedule_type.clone());
        Ok(schedule_type)
    }

    pub fn schedule_type(&self, type_id: Uuid) -> Option<ScheduleType> {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        types.get(&type_id).cloned()
    }
}
