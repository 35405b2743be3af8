//! Validates a strategy's typed conditions against classified indicators
//! and an upstream AI directional hint.
//!
//! Evaluation is two-tier: required conditions are hard gates checked
//! first (any failure rejects immediately, regardless of the configured
//! logic), then the remaining optional conditions combine under And/Or.
//! Every evaluation returns the full per-condition breakdown.

use crate::models::indicators::Timeframe;
use crate::models::signal::Direction;
use crate::models::strategy::{
    ConditionCheck, ConditionOperator, IndicatorKind, LogicType, StrategyCondition, StrategyConfig,
    ValidationResult,
};
use crate::models::{Alignment, CrossType};
use crate::signals::{ClassifiedIndicators, MacdReading, SarReading};
use tracing::debug;

pub struct StrategyValidator;

impl StrategyValidator {
    /// Validate the buy (entry) side of a strategy.
    pub fn validate_entry(
        config: &StrategyConfig,
        ai_hint: Option<Direction>,
        indicators: &ClassifiedIndicators,
    ) -> ValidationResult {
        Self::validate(&config.buy_conditions, config.buy_logic, ai_hint, indicators)
    }

    /// Validate the sell (exit) side of a strategy. Callers pass the exit
    /// direction as the hint (the opposite of the open position's side).
    pub fn validate_exit(
        config: &StrategyConfig,
        exit_direction: Direction,
        indicators: &ClassifiedIndicators,
    ) -> ValidationResult {
        Self::validate(
            &config.sell_conditions,
            config.sell_logic,
            Some(exit_direction),
            indicators,
        )
    }

    /// Evaluate a condition list under the given combine logic.
    pub fn validate(
        conditions: &[StrategyCondition],
        logic: LogicType,
        ai_hint: Option<Direction>,
        indicators: &ClassifiedIndicators,
    ) -> ValidationResult {
        // Zero enabled conditions is a vacuous strategy: nothing gates the
        // trade, so it passes through the normal combine path below.
        let enabled: Vec<&StrategyCondition> =
            conditions.iter().filter(|c| c.enabled).collect();

        let mut details = Vec::with_capacity(enabled.len());
        for condition in &enabled {
            let check = Self::check_condition(condition, ai_hint, indicators);
            debug!(
                condition = %check.condition_id,
                passed = check.passed,
                reason = %check.reason,
                "condition evaluated"
            );
            details.push(check);
        }

        // Required conditions short-circuit: a failing hard gate rejects
        // the whole strategy no matter how the optional logic is wired.
        for (condition, check) in enabled.iter().zip(&details) {
            if condition.required && !check.passed {
                return ValidationResult {
                    passed: false,
                    reason: format!(
                        "required condition '{}' failed: {}",
                        check.condition_name, check.reason
                    ),
                    details,
                };
            }
        }

        let optional: Vec<&ConditionCheck> = enabled
            .iter()
            .zip(&details)
            .filter(|(c, _)| !c.required)
            .map(|(_, check)| check)
            .collect();

        // An empty optional set trivially passes (required gates already held).
        let passed = match logic {
            _ if optional.is_empty() => true,
            LogicType::And => optional.iter().all(|c| c.passed),
            LogicType::Or => optional.iter().any(|c| c.passed),
        };

        let logic_name = match logic {
            LogicType::And => "AND",
            LogicType::Or => "OR",
        };
        ValidationResult {
            passed,
            reason: if passed {
                format!("strategy passed ({} logic)", logic_name)
            } else {
                format!("strategy failed ({} logic)", logic_name)
            },
            details,
        }
    }

    fn check_condition(
        condition: &StrategyCondition,
        ai_hint: Option<Direction>,
        indicators: &ClassifiedIndicators,
    ) -> ConditionCheck {
        // Explicit condition-level direction wins; otherwise fall back to
        // the AI hint. With neither, fail rather than guess a side.
        let expected = match condition.direction.or(ai_hint) {
            Some(direction) => direction,
            None => {
                return Self::check(
                    condition,
                    false,
                    "direction unknown: no condition direction and no AI hint",
                    "long or short",
                    "none",
                )
            }
        };

        match condition.indicator {
            IndicatorKind::Sar => Self::check_sar(condition, expected, indicators),
            IndicatorKind::Macd => Self::check_macd(condition, expected, indicators),
        }
    }

    fn check_sar(
        condition: &StrategyCondition,
        expected: Direction,
        indicators: &ClassifiedIndicators,
    ) -> ConditionCheck {
        let reading: Option<&SarReading> = match condition.timeframe {
            Timeframe::Daily => indicators.daily_sar.as_ref(),
            Timeframe::FifteenMinute => indicators.sar_15m.as_ref(),
        };
        let Some(sar) = reading else {
            return Self::check(
                condition,
                false,
                "no confirmed SAR signal yet (insufficient candles)",
                &expected.to_string(),
                "none",
            );
        };

        match condition.operator {
            ConditionOperator::Direction => {
                let passed = sar.signal == expected;
                let reason = if passed {
                    format!("SAR trend is {}", sar.signal)
                } else {
                    format!("SAR trend is {}, expected {}", sar.signal, expected)
                };
                Self::check(condition, passed, &reason, &expected.to_string(), &sar.signal.to_string())
            }
            ConditionOperator::Reversal => {
                // The reversal must land on the expected side; any old flip
                // does not count.
                let passed = sar.is_reversal && sar.signal == expected;
                let reason = if passed {
                    format!("SAR reversed to {}", expected)
                } else if sar.is_reversal {
                    format!("SAR reversed to {}, expected {}", sar.signal, expected)
                } else {
                    format!("no SAR reversal (trend {})", sar.signal)
                };
                Self::check(
                    condition,
                    passed,
                    &reason,
                    &format!("reversal->{}", expected),
                    &format!("reversal={}, signal={}", sar.is_reversal, sar.signal),
                )
            }
            ConditionOperator::Cross | ConditionOperator::Alignment => Self::check(
                condition,
                false,
                "operator not applicable to SAR",
                "direction or reversal",
                "cross/alignment",
            ),
        }
    }

    fn check_macd(
        condition: &StrategyCondition,
        expected: Direction,
        indicators: &ClassifiedIndicators,
    ) -> ConditionCheck {
        let reading: Option<&MacdReading> = match condition.timeframe {
            Timeframe::FifteenMinute => indicators.macd_15m.as_ref(),
            Timeframe::Daily => None,
        };
        let Some(macd) = reading else {
            return Self::check(
                condition,
                false,
                "no MACD reading yet (insufficient candles or unsupported timeframe)",
                &expected.to_string(),
                "none",
            );
        };

        let actual = format!(
            "cross={:?}, alignment={:?}, DIF{}DEA",
            macd.cross,
            macd.alignment,
            if macd.dif > macd.dea { ">" } else { "<=" }
        );

        match condition.operator {
            ConditionOperator::Cross => {
                let wanted = match expected {
                    Direction::Long => CrossType::Golden,
                    Direction::Short => CrossType::Death,
                };
                let passed = macd.cross == Some(wanted);
                let reason = match (passed, macd.cross) {
                    (true, _) => format!("MACD {:?} cross confirms {}", wanted, expected),
                    (false, Some(other)) => {
                        format!("MACD {:?} cross conflicts with {}", other, expected)
                    }
                    (false, None) => format!("no fresh MACD cross for {}", expected),
                };
                Self::check(condition, passed, &reason, &format!("{:?} cross", wanted), &actual)
            }
            ConditionOperator::Alignment => {
                let wanted = match expected {
                    Direction::Long => Alignment::Bullish,
                    Direction::Short => Alignment::Bearish,
                };
                let passed = macd.alignment == Some(wanted);
                let reason = if passed {
                    format!("MACD {:?} alignment confirms {}", wanted, expected)
                } else {
                    format!("MACD alignment is {:?}, expected {:?}", macd.alignment, wanted)
                };
                Self::check(
                    condition,
                    passed,
                    &reason,
                    &format!("{:?} alignment", wanted),
                    &actual,
                )
            }
            ConditionOperator::Direction | ConditionOperator::Reversal => Self::check(
                condition,
                false,
                "operator not applicable to MACD",
                "cross or alignment",
                "direction/reversal",
            ),
        }
    }

    fn check(
        condition: &StrategyCondition,
        passed: bool,
        reason: &str,
        expected: &str,
        actual: &str,
    ) -> ConditionCheck {
        ConditionCheck {
            condition_id: condition.id.clone(),
            condition_name: condition.name.clone(),
            passed,
            reason: reason.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
