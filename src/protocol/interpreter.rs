//! Maps free-text status lines from the firmware to display field updates and
//! system state transitions.
//!
//! The firmware does not frame its messages beyond the line terminator, and a
//! single line may carry several signals at once (e.g. confirm the stock and
//! reassert readiness). Interpretation therefore runs two fixed tables against
//! the uppercased line:
//!
//! * **field rules**: every field is checked on its own, and within a field the
//!   first matching pattern wins. A line can update all three fields.
//! * **state rules**: checked in priority order, the first match wins and
//!   yields the only state transition for the line. The two compound recovery
//!   rules come last and need all of their phrases to be present. They never
//!   override a direct rule matched earlier on the same line, and a line logs
//!   at most one note.
//!
//! Lines matching nothing produce an empty [`Interpretation`]; they are still
//! worth logging but change nothing.

use super::model::{FieldValue, Output, Position, Stock, SystemState};

// =============================================================================
// Public Interface
// =============================================================================

/// The effect of a single status line.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Interpretation {
    /// Field values reported by the line, at most one per field.
    pub fields: Vec<FieldValue>,
    /// The state the device moved to, if the line says so.
    pub state: Option<SystemState>,
    /// Extra operator-facing message attached to the matched state rule.
    pub note: Option<&'static str>,
}
impl Interpretation {
    /// `true` when the line matched no rule at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.state.is_none()
    }

    /// Whether the dispense action should be offered after this line, or
    /// `None` when the line leaves the state unchanged.
    pub fn dispense_enabled(&self) -> Option<bool> {
        self.state.map(SystemState::allows_dispense)
    }
}

/// Interpret a raw status line. Pure and stateless: the same line always gives
/// the same result.
pub fn interpret(line: &str) -> Interpretation {
    let upper = line.to_uppercase();

    let fields = FIELD_RULES
        .iter()
        .filter_map(|rules| {
            rules
                .iter()
                .find(|(pattern, _)| upper.contains(pattern))
                .map(|(_, value)| *value)
        })
        .collect();

    let rule = STATE_RULES.iter().find(|rule| rule.matcher.matches(&upper));

    Interpretation {
        fields,
        state: rule.map(|r| r.state),
        note: rule.and_then(|r| r.note),
    }
}

// =============================================================================
// Private stuff
// =============================================================================

enum Matcher {
    /// Any one of the phrases is enough.
    Any(&'static [&'static str]),
    /// All of the phrases must be present, in any order.
    All(&'static [&'static str]),
}
impl Matcher {
    fn matches(&self, upper: &str) -> bool {
        match self {
            Matcher::Any(phrases) => phrases.iter().any(|p| upper.contains(p)),
            Matcher::All(phrases) => phrases.iter().all(|p| upper.contains(p)),
        }
    }
}

struct StateRule {
    matcher: Matcher,
    state: SystemState,
    note: Option<&'static str>,
}

type FieldRules = &'static [(&'static str, FieldValue)];

static FIELD_RULES: [FieldRules; 3] = [
    &[
        ("ESTOQUE: VAZIO", FieldValue::Stock(Stock::Empty)),
        ("ESTOQUE: COM ENVELOPES", FieldValue::Stock(Stock::Loaded)),
    ],
    &[
        ("SAÍDA: OCUPADA", FieldValue::Output(Output::Busy)),
        ("SAÍDA: LIVRE", FieldValue::Output(Output::Free)),
    ],
    &[
        (
            "POSIÇÃO: ENVELOPE PRESENTE",
            FieldValue::Position(Position::Present),
        ),
        ("POSIÇÃO: LIVRE", FieldValue::Position(Position::Free)),
    ],
];

static STATE_RULES: [StateRule; 8] = [
    StateRule {
        matcher: Matcher::Any(&["REPOUSO - PRONTO PARA USO"]),
        state: SystemState::Ready,
        note: Some("System ready to dispense"),
    },
    StateRule {
        matcher: Matcher::Any(&["AGUARDANDO RETIRADA"]),
        state: SystemState::AwaitingPickup,
        note: None,
    },
    StateRule {
        matcher: Matcher::Any(&["ERRO - ESTOQUE VAZIO"]),
        state: SystemState::StockEmpty,
        note: None,
    },
    StateRule {
        matcher: Matcher::Any(&["ERRO - SAÍDA OCUPADA"]),
        state: SystemState::OutputBusy,
        note: None,
    },
    StateRule {
        matcher: Matcher::Any(&[
            "EJETANDO ENVELOPE",
            "AVANÇANDO ENVELOPE",
            "LEVANDO ENVELOPE",
        ]),
        state: SystemState::InOperation,
        note: None,
    },
    StateRule {
        matcher: Matcher::Any(&["VERIFICANDO CONDIÇÕES"]),
        state: SystemState::Verifying,
        note: None,
    },
    StateRule {
        matcher: Matcher::All(&["ENVELOPE RETIRADO", "SISTEMA PRONTO"]),
        state: SystemState::Ready,
        note: Some("Envelope taken - system ready for the next cycle"),
    },
    StateRule {
        matcher: Matcher::All(&["SISTEMA RESETADO", "PRONTO PARA USO"]),
        state: SystemState::Ready,
        note: Some("System reset successfully"),
    },
];

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_empty_updates_the_field_only() {
        let result = interpret("Estoque: vazio");
        assert_eq!(result.fields, vec![FieldValue::Stock(Stock::Empty)]);
        assert_eq!(result.state, None);
        assert_eq!(result.dispense_enabled(), None);
    }

    #[test]
    fn idle_line_means_ready() {
        let result = interpret("Repouso - pronto para uso");
        assert_eq!(result.state, Some(SystemState::Ready));
        assert_eq!(result.dispense_enabled(), Some(true));
        assert!(result.note.is_some());
    }

    #[test]
    fn awaiting_pickup_disables_dispense() {
        let result = interpret("Aguardando retirada");
        assert_eq!(result.state, Some(SystemState::AwaitingPickup));
        assert_eq!(result.dispense_enabled(), Some(false));
    }

    #[test]
    fn envelope_taken_recovers_ready() {
        let result = interpret("Envelope retirado - Sistema pronto");
        assert_eq!(result.state, Some(SystemState::Ready));
        assert_eq!(result.dispense_enabled(), Some(true));
        assert_eq!(
            result.note,
            Some("Envelope taken - system ready for the next cycle")
        );
    }

    #[test]
    fn compound_rule_needs_both_phrases() {
        assert!(interpret("Envelope retirado").is_empty());
        assert!(interpret("Sistema pronto").is_empty());
        assert!(interpret("Sistema resetado").is_empty());
    }

    #[test]
    fn reset_recovers_ready() {
        let result = interpret("Sistema resetado - pronto para uso");
        assert_eq!(result.state, Some(SystemState::Ready));
        assert_eq!(result.note, Some("System reset successfully"));
    }

    #[test]
    fn operation_synonyms() {
        for line in &[
            "Ejetando envelope...",
            "Avançando envelope",
            "Levando envelope para a saída",
        ] {
            assert_eq!(interpret(line).state, Some(SystemState::InOperation));
        }
    }

    #[test]
    fn error_states() {
        assert_eq!(
            interpret("ERRO - Estoque vazio").state,
            Some(SystemState::StockEmpty)
        );
        assert_eq!(
            interpret("ERRO - Saída ocupada").state,
            Some(SystemState::OutputBusy)
        );
        assert_eq!(
            interpret("Verificando condições...").state,
            Some(SystemState::Verifying)
        );
    }

    #[test]
    fn error_line_does_not_touch_the_stock_field() {
        // "ESTOQUE VAZIO" without the colon is the error message, not the field
        assert!(interpret("ERRO - Estoque vazio").fields.is_empty());
    }

    #[test]
    fn unknown_lines_are_pass_through() {
        for line in &["", "hello", "Dispenser v1.2", "ERRO_LEITURA: boom", "12345"] {
            let result = interpret(line);
            assert!(result.is_empty(), "{:?} -> {:?}", line, result);
            assert_eq!(result.note, None);
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            interpret("ESTOQUE: COM ENVELOPES").fields,
            interpret("estoque: com envelopes").fields
        );
        assert_eq!(
            interpret("posição: envelope presente").fields,
            vec![FieldValue::Position(Position::Present)]
        );
        assert_eq!(
            interpret("saída: livre").fields,
            vec![FieldValue::Output(Output::Free)]
        );
    }

    #[test]
    fn one_line_can_update_every_field() {
        let result = interpret(
            "Estoque: com envelopes | Saída: ocupada | Posição: livre | Repouso - pronto para uso",
        );
        assert_eq!(
            result.fields,
            vec![
                FieldValue::Stock(Stock::Loaded),
                FieldValue::Output(Output::Busy),
                FieldValue::Position(Position::Free),
            ]
        );
        assert_eq!(result.state, Some(SystemState::Ready));
    }

    #[test]
    fn first_field_pattern_wins_within_a_field() {
        let result = interpret("Estoque: vazio / Estoque: com envelopes");
        assert_eq!(result.fields, vec![FieldValue::Stock(Stock::Empty)]);
    }

    #[test]
    fn first_state_rule_wins() {
        let result = interpret("Aguardando retirada - Verificando condições");
        assert_eq!(result.state, Some(SystemState::AwaitingPickup));

        // a direct rule outranks the compound recovery rules
        let result = interpret("Aguardando retirada / Envelope retirado - Sistema pronto");
        assert_eq!(result.state, Some(SystemState::AwaitingPickup));
        assert_eq!(result.note, None);
    }

    #[test]
    fn compound_rules_do_not_override_a_direct_match() {
        let result = interpret("Verificando condições / Envelope retirado - Sistema pronto");
        assert_eq!(result.state, Some(SystemState::Verifying));
        assert_eq!(result.note, None);

        // both compound rules on one line: only the first fires
        let result = interpret(
            "Envelope retirado - Sistema pronto / Sistema resetado - pronto para uso",
        );
        assert_eq!(result.state, Some(SystemState::Ready));
        assert_eq!(
            result.note,
            Some("Envelope taken - system ready for the next cycle")
        );
    }

    #[test]
    fn interpretation_is_idempotent() {
        for line in &[
            "Estoque: vazio",
            "Repouso - pronto para uso",
            "Envelope retirado - Sistema pronto",
            "nothing to see",
        ] {
            assert_eq!(interpret(line), interpret(line));
        }
    }
}
